/*
A thread that prints the reports nodes send back to the operator. Rows from
different nodes arrive in no particular order.
*/

use std::{
    io::Write,
    sync::mpsc::Receiver,
    thread::{self, JoinHandle},
};

use load_balancer_net::contracts::{Envelope, Message};
use log::warn;

pub struct ReportPrinter<W: Write + Send + 'static> {
    inbox: Receiver<Envelope>,
    output: W,
}

impl<W: Write + Send + 'static> ReportPrinter<W> {
    pub fn new(inbox: Receiver<Envelope>, output: W) -> Self {
        Self { inbox, output }
    }

    pub fn start(self: Self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    /// Runs until every sender has gone away
    pub fn run(mut self: Self) {
        while let Ok(envelope) = self.inbox.recv() {
            self.print(envelope);
        }
    }

    fn print(self: &mut Self, envelope: Envelope) {
        match envelope.message {
            Message::Report(report) => {
                for line in report.lines.iter() {
                    if let Err(e) = writeln!(self.output, "{line}") {
                        warn!("ReportPrinter: {e}");
                    }
                }
                let _ = self.output.flush();
            }
            message => warn!("ReportPrinter: Ignoring {message} from rank {}", envelope.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc::channel, Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    #[test]
    fn prints_report_lines_and_skips_other_messages() {
        let (sender, receiver) = channel::<Envelope>();
        let output = SharedOutput::default();
        let printer = ReportPrinter::new(receiver, output.clone()).start();

        sender
            .send(Envelope::new(2, Message::report(vec![String::from("a"), String::from("b")])))
            .unwrap();
        sender.send(Envelope::new(1, Message::presence())).unwrap();
        drop(sender);
        printer.join().unwrap();

        assert_eq!("a\nb\n", String::from_utf8(output.0.lock().unwrap().clone()).unwrap());
    }
}
