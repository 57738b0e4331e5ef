mod test_app;

use std::sync::Arc;

use test_app::{Greeter, Program};

#[tokio::main]
async fn main() {
    Program::print_number_async(42)
        .await
        .expect("print_number task panicked");

    let squared = Program::square_async(12).await.expect("square task panicked");
    println!("12 squared is {squared}");

    let greeter = Arc::new(Greeter::new("Hello"));
    let greeting = greeter.greet_async("asyncify".to_string()).await.expect("greet task panicked");
    println!("{greeting}");

    let sum = test_app::checksum_async(b"asyncify".to_vec())
        .await
        .expect("checksum task panicked");
    println!("checksum: {sum}");
}
