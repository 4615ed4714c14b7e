/*
Rows of the task listing that participating nodes report to the operator.
The operator prints the header once and each node contributes its own rows.
*/

use crate::{
    contracts::LIST_LONG,
    data_types::{GlobalId, ListFlag, LocalHandle},
    formatting::{PlainTextBuilder, ToPlainText},
};

const HOST_WIDTH: usize = 16;
const UID_WIDTH: usize = 7;
const PID_WIDTH: usize = 8;
const GPID_WIDTH: usize = 8;

pub struct TaskListing<'a> {
    pub format: ListFlag,
    pub host_name: &'a str,
    pub uid: u32,
    pub local_handle: LocalHandle,
    pub global_id: GlobalId,
    pub command_line: &'a [String],
}

impl<'a> TaskListing<'a> {
    pub fn header(format: ListFlag) -> String {
        let mut builder = PlainTextBuilder::new();
        if format == LIST_LONG {
            builder.str_left("HOST", HOST_WIDTH);
            builder.str_left("UID", UID_WIDTH);
        }
        builder.str_left("PID", PID_WIDTH);
        builder.str_left("GPID", GPID_WIDTH);
        builder.str_left("CMD", 0);
        builder.build().trim_end().to_owned()
    }
}

impl<'a> ToPlainText for TaskListing<'a> {
    fn to_plain_text(self: &Self, builder: &mut PlainTextBuilder) {
        if self.format == LIST_LONG {
            builder.str_left(self.host_name, HOST_WIDTH);
            builder.u32_left(self.uid, UID_WIDTH);
        }
        builder.u32_left(self.local_handle, PID_WIDTH);
        builder.u32_left(self.global_id, GPID_WIDTH);
        builder.words(self.command_line);
        builder.new_line();
    }
}
