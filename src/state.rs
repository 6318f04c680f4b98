use crate::hardware::FruInventory;
use crate::scheduler::LastCheck;
use crate::services::HardwareSource;
use crate::store::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct AppStateInner {
    /// 状态查询时需要修改 FRU，整个查询期间持有锁
    pub inventory: Mutex<FruInventory>,
    pub hardware_source: Arc<dyn HardwareSource>,
    pub store: Arc<dyn StateStore>,
    pub last_check: LastCheck,
    pub call_timeout: Duration,
}

pub type AppState = Arc<AppStateInner>;

pub fn new_state(
    inventory: FruInventory,
    hardware_source: Arc<dyn HardwareSource>,
    store: Arc<dyn StateStore>,
    last_check: LastCheck,
    call_timeout: Duration,
) -> AppState {
    Arc::new(AppStateInner {
        inventory: Mutex::new(inventory),
        hardware_source,
        store,
        last_check,
        call_timeout,
    })
}
