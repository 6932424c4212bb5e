//! Real-time scheduling helpers (Linux SCHED_FIFO + mlockall).
//!
//! The stabilizer has a 20 ms deadline; running the process under SCHED_FIFO
//! with locked memory keeps the scheduler and the page cache out of the loop.
//! Best-effort: failures are logged, never fatal.

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool) {
    use libc::{
        MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, mlockall, sched_get_priority_min, sched_param,
        sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    RT_ONCE.get_or_init(|| {
        unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let prio = if min < 0 { 1 } else { min.max(1) };
            let param = sched_param {
                sched_priority: prio,
            };
            if sched_setscheduler(0, SCHED_FIFO, &param) != 0 {
                let err = std::io::Error::last_os_error();
                tracing::warn!(%err, "SCHED_FIFO not applied (needs CAP_SYS_NICE?)");
            } else {
                tracing::info!(prio, "SCHED_FIFO scheduling applied");
            }

            if mlockall(MCL_CURRENT | MCL_FUTURE) != 0 {
                let err = std::io::Error::last_os_error();
                tracing::warn!(%err, "mlockall failed; page faults may add jitter");
            } else {
                tracing::info!("process memory locked");
            }
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool) {
    if rt {
        tracing::warn!("--rt is only supported on Linux; ignoring");
    }
}
