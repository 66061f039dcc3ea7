use vista_ngin::{
    demos::earth::Earth,
    flow::{RunOptions, run},
};

fn main() {
    if let Err(e) = run::<Earth>(RunOptions::from_env()) {
        eprintln!("earth: {e:#}");
        std::process::exit(1);
    }
}
