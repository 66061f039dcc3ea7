use vista_ngin::{
    demos::wire_sphere::WireSphere,
    flow::{RunOptions, run},
};

fn main() {
    if let Err(e) = run::<WireSphere>(RunOptions::from_env()) {
        eprintln!("wire-sphere: {e:#}");
        std::process::exit(1);
    }
}
