/// Identifies this machine and user in long task listings
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub host_name: String,
    pub uid: u32,
}

impl HostInfo {
    pub fn new(host_name: &str, uid: u32) -> Self {
        Self {
            host_name: host_name.to_owned(),
            uid,
        }
    }

    pub fn detect() -> Self {
        Self {
            host_name: detect_host_name(),
            uid: unsafe { libc::getuid() },
        }
    }
}

fn detect_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| String::from("localhost"))
}
