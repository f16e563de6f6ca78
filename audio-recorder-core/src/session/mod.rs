pub mod capture_session;
mod finalizer;
mod shared;
mod worker;

#[cfg(test)]
pub(crate) mod test_support;
