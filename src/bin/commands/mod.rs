pub mod batch_cmd;
pub mod bench_cmd;
pub mod inspect_cmd;
pub mod query_cmd;
pub mod validate_cmd;

pub use batch_cmd::cmd_batch;
pub use bench_cmd::cmd_bench;
pub use inspect_cmd::cmd_inspect;
pub use query_cmd::cmd_query;
pub use validate_cmd::cmd_validate;
