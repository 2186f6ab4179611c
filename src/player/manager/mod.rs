mod idle;
mod monitor;
mod start;

pub(crate) use idle::{IdleTimer, schedule_idle_teardown};
pub(crate) use monitor::monitor_loop;
pub(crate) use start::start_current;
