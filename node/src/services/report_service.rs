/*
Answers the operator's listing and presence requests. Only participating nodes
answer. Replies are logged locally and sent to the operator as report lines.
*/

use load_balancer_net::{
    data_types::ListFlag,
    formatting::{PlainTextBuilder, ToPlainText},
    listing::TaskListing,
};
use log::info;

use crate::node::Node;

impl Node {
    pub(crate) fn on_list(self: &mut Self, format: ListFlag) {
        if !self.is_participating() {
            return;
        }

        let mut builder = PlainTextBuilder::new();
        for (_, entry) in self.tasks.iter() {
            TaskListing {
                format,
                host_name: &self.host.host_name,
                uid: self.host.uid,
                local_handle: entry.local_handle,
                global_id: entry.global_id,
                command_line: &entry.command_line,
            }
            .to_plain_text(&mut builder);
        }

        let lines = builder.build_lines();
        for line in lines.iter() {
            info!("Node {}: {line}", self.rank);
        }
        if !lines.is_empty() {
            self.report(lines);
        }
    }

    pub(crate) fn on_presence(self: &mut Self) {
        if !self.is_participating() {
            return;
        }
        let line = format!(
            "Node {} on {} is participating with {} tasks",
            self.rank,
            self.host.host_name,
            self.tasks.len()
        );
        info!("Node {}: Present", self.rank);
        self.report(vec![line]);
    }
}
