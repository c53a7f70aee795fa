//! Desktop platform implementations

use rand::Rng;

use crate::ports::outbound::RandomPort;

/// Desktop random provider using rand crate
#[derive(Clone, Default)]
pub struct DesktopRandomProvider;

impl RandomPort for DesktopRandomProvider {
    fn pick_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_index_stays_in_range() {
        let random = DesktopRandomProvider;
        for len in 1..20 {
            assert!(random.pick_index(len) < len);
        }
        assert_eq!(random.pick_index(0), 0);
    }
}
