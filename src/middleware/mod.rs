mod access_guard;

pub use access_guard::AccessGuard;
