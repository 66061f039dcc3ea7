use vista_ngin::{
    demos::digital_path::DigitalPath,
    flow::{RunOptions, run},
};

fn main() {
    if let Err(e) = run::<DigitalPath>(RunOptions::from_env()) {
        eprintln!("digital-path: {e:#}");
        std::process::exit(1);
    }
}
