// src/monitor/probe.rs

use std::fmt;
use std::sync::Mutex;

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// Answers "does this PID still name a live process?".
pub trait ProcessProbe: Send + Sync + fmt::Debug {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probe backed by `sysinfo`. Zombies and dead entries count as gone.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SysinfoProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SysinfoProbe").finish_non_exhaustive()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn is_alive(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match system.process(pid) {
            Some(process) => !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_alive() {
        let probe = SysinfoProbe::new();
        assert!(probe.is_alive(std::process::id()));
    }

    #[test]
    fn unused_pid_is_not_alive() {
        // Above the default Linux pid_max and macOS's PID range.
        assert!(!SysinfoProbe::new().is_alive(u32::MAX - 1));
    }
}
