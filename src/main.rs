use std::env;
use std::io;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut stdout = io::stdout().lock();
    let code = fib_bench::cli::run(&args, &mut stdout).await;
    ExitCode::from(fib_bench::cli::finish(&mut stdout, code))
}
