#[cfg(feature = "integration-tests")]
use vista_ngin::{
    demos::digital_path::DigitalPath,
    flow::{RunOptions, run},
};

// winit allows a single event loop per process, so only the bloom demo runs here.
#[test]
#[cfg(feature = "integration-tests")]
fn digital_path_renders_a_few_frames_and_exits() {
    let options = RunOptions {
        seed: Some(1),
        max_frames: Some(5),
    };
    run::<DigitalPath>(options).unwrap();
}
