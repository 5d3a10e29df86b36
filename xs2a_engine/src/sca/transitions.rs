use crate::db_types::ScaStatus::{self, *};

/// Whether a single SCA step may move an authorisation from `from` to `to`.
///
/// A non-terminal status may always stay where it is (an attempt failure or a malformed update). Terminal statuses
/// never change.
pub fn is_allowed(from: ScaStatus, to: ScaStatus) -> bool {
    if from == to {
        return true;
    }
    match from {
        Received => matches!(to, PsuIdentified | PsuAuthenticated | ScaMethodSelected | Failed | Exempted),
        PsuIdentified | Started => matches!(to, PsuAuthenticated | ScaMethodSelected | Failed | Exempted),
        PsuAuthenticated => matches!(to, ScaMethodSelected | Failed | Exempted),
        ScaMethodSelected => matches!(to, Finalised | Failed | Exempted),
        Finalised | Failed | Exempted => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn terminal_statuses_are_sticky() {
        for from in [Finalised, Failed, Exempted] {
            for to in ScaStatus::ALL {
                assert_eq!(is_allowed(from, to), from == to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn every_non_terminal_status_can_fail_or_be_exempted() {
        for from in ScaStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(is_allowed(from, Failed));
            assert!(is_allowed(from, Exempted));
            assert!(is_allowed(from, from));
        }
    }

    #[test]
    fn happy_paths() {
        assert!(is_allowed(Received, PsuIdentified));
        assert!(is_allowed(Started, PsuAuthenticated));
        assert!(is_allowed(PsuAuthenticated, ScaMethodSelected));
        assert!(is_allowed(ScaMethodSelected, Finalised));
    }

    #[test]
    fn shortcuts_are_refused() {
        assert!(!is_allowed(Received, Finalised));
        assert!(!is_allowed(Started, Finalised));
        assert!(!is_allowed(PsuAuthenticated, Finalised));
        assert!(!is_allowed(ScaMethodSelected, PsuAuthenticated));
        assert!(!is_allowed(Started, Received));
        assert!(!is_allowed(PsuIdentified, Received));
    }
}
