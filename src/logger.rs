use std::io::Write;

use env_logger::{Builder, Env};

/// Initialize the logger
///
/// The level comes from `RUST_LOG` and defaults to `warn`, so the shell
/// stays quiet unless asked. Each line carries the module path and line
/// number of the call site.
pub fn initialize_logger() {
    let env = Env::default().default_filter_or("warn");
    let mut builder = Builder::from_env(env);

    builder.format(|buf, record| {
        let path = record.module_path().unwrap_or("");
        let line = record.line().map(|l| l.to_string()).unwrap_or_default();
        writeln!(
            buf,
            "[{:<5} {}:{}] {}",
            record.level(),
            path,
            line,
            record.args()
        )
    });

    // A second call (tests, embedding) keeps the first logger
    let _ = builder.try_init();
}
