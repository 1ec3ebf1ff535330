use std::sync::{Mutex, OnceLock};
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_mb: u64,
    pub used_mb: u64,
    pub avail_mb: u64,
}

static SYS: OnceLock<Mutex<System>> = OnceLock::new();

fn sys_handle() -> &'static Mutex<System> {
    SYS.get_or_init(|| {
        Mutex::new(System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        ))
    })
}

/// System-wide memory snapshot in MiB. A poisoned lock yields zeros.
pub fn memory_stats_mb() -> MemoryStats {
    let Ok(mut sys) = sys_handle().lock() else {
        return MemoryStats::default();
    };
    sys.refresh_memory();
    // sysinfo reports bytes
    let total_mb = sys.total_memory() / (1024 * 1024);
    let avail_mb = sys.available_memory() / (1024 * 1024);
    MemoryStats {
        total_mb,
        used_mb: total_mb.saturating_sub(avail_mb),
        avail_mb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_consistent() {
        let m = memory_stats_mb();
        assert!(m.used_mb <= m.total_mb);
    }
}
