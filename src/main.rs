use tokio::runtime::Builder;

use supportbot::web::server::start_app;

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let runtime = Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("supportbot")
        .thread_stack_size(3 * 1024 * 1024)
        .enable_io()
        .enable_time()
        .build()
        .unwrap();

    runtime.block_on(start_app());
}
