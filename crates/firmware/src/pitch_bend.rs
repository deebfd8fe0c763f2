//! The pitch bend ramp timer.
//!
//! The ramp runs on a higher priority executor than the main loop so that it keeps a steady rate regardless of how
//! long a main loop iteration takes. It only advances the shared [`PitchBendRamp`]; sending is left to the main loop.

use embassy_time::Ticker;
use tiny_key_lib::{configuration::TICK_INTERVAL, pitch_bend::PitchBendRamp};

/// Pitch bend state shared between the ramp timer and the main loop.
pub static PITCH_BEND: PitchBendRamp = PitchBendRamp::new();

#[embassy_executor::task]
pub async fn ramp_timer() -> ! {
    let mut ticker = Ticker::every(TICK_INTERVAL);
    loop {
        ticker.next().await;
        PITCH_BEND.tick();
    }
}
