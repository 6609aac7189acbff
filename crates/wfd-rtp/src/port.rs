//! RTP port selection (spec §4.4, §9 Open Question): an even port chosen
//! uniformly at random in `[1024, 65534)`.

use rand::Rng;

use wfd_core::wire::{RTP_PORT_RANGE_END, RTP_PORT_RANGE_START};

#[must_use]
pub fn pick_random_rtp_port() -> u16 {
    let range = (RTP_PORT_RANGE_END - RTP_PORT_RANGE_START) / 2;
    let n: u16 = rand::thread_rng().gen_range(0..=range);
    RTP_PORT_RANGE_START + n * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_port_is_even_and_in_range() {
        for _ in 0..1000 {
            let port = pick_random_rtp_port();
            assert_eq!(port % 2, 0);
            assert!(port >= RTP_PORT_RANGE_START && port < RTP_PORT_RANGE_END);
        }
    }
}
