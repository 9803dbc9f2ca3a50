#![cfg(target_arch = "wasm32")]

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init() {
	INIT.call_once(tracing_wasm::set_as_global_default);
}
