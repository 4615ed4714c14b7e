use super::{payloads::Report, Envelope, Message};
use std::fmt::Display;

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Load(sample) => write!(f, "LOAD load:{:.2}", sample.load),
            Message::Place(place) => write!(f, "PLACE cmd:{}", place.command_line.join(" ")),
            Message::List(list) => write!(f, "LIST format:{}", list.format),
            Message::Signal(signal) => write!(
                f,
                "SIGNAL signal:{} gpid:{}",
                signal.signal, signal.global_id
            ),
            Message::SignalResolved(entry) => write!(
                f,
                "SIGNAL_RESOLVED gpid:{} slot:{}",
                entry.global_id, entry.slot
            ),
            Message::DirectoryUpdate(entry) => write!(
                f,
                "DIRECTORY_UPDATE gpid:{} slot:{}",
                entry.global_id, entry.slot
            ),
            Message::FindOwner(signal) => write!(
                f,
                "FIND_OWNER signal:{} gpid:{}",
                signal.signal, signal.global_id
            ),
            Message::Admit(notice) => write!(f, "ADMIT rank:{}", notice.rank),
            Message::TaskTransfer(transfer) => write!(
                f,
                "TASK_TRANSFER gpid:{} cmd:{}",
                transfer.global_id,
                transfer.command_line.join(" ")
            ),
            Message::Withdraw(notice) => write!(f, "WITHDRAW rank:{}", notice.rank),
            Message::Terminate(_) => write!(f, "TERMINATE"),
            Message::Presence(_) => write!(f, "PRESENCE"),
            Message::Report(report) => write!(f, "REPORT lines:{}", report.lines.len()),
        }
    }
}

impl Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from rank {}", self.message, self.source)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}
