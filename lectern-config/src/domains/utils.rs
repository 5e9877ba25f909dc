//! Serde default helpers shared by the domain configs

pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}
