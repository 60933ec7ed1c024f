//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `outbound_core::defaults`.

use outbound_core::defaults;

/// Generate default value functions that forward to outbound_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_tcp_no_delay       => DEFAULT_TCP_NO_DELAY: bool,
    default_tcp_keepalive_secs => DEFAULT_TCP_KEEPALIVE_SECS: u64,
}

default_string_fns! {
    default_ws_path => DEFAULT_WS_PATH,
}
