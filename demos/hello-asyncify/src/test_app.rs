use asyncify::asyncify;

pub struct Program;

impl Program {
    #[asyncify]
    pub fn print_number(number: i32) {
        println!("{number}");
    }

    #[asyncify]
    pub fn square(value: u64) -> u64 {
        value * value
    }
}

asyncify::include_generated!("test_app-Program.asyncify.rs");

pub struct Greeter {
    greeting: String,
}

impl Greeter {
    pub fn new(greeting: &str) -> Self {
        Self {
            greeting: greeting.to_string(),
        }
    }

    #[asyncify]
    pub fn greet(&self, name: String) -> String {
        format!("{}, {name}!", self.greeting)
    }
}

asyncify::include_generated!("test_app-Greeter.asyncify.rs");

#[asyncify]
pub fn checksum(data: Vec<u8>) -> u32 {
    data.iter().map(|&byte| u32::from(byte)).sum()
}

asyncify::include_generated!("test_app.asyncify.rs");
