pub mod unwrap_helper {
    // Unwrap an Option or bail out of the enclosing function with the provided value
    macro_rules! return_default {
        ($expression:expr, $default:expr) => {
            match $expression {
                Some(inner) => inner,
                None => return $default,
            }
        };
    }

    // Unwrap an Option or skip to the next loop iteration
    macro_rules! continue_default {
        ($expression:expr) => {
            match $expression {
                Some(inner) => inner,
                None => continue,
            }
        };
    }

    pub(crate) use continue_default;
    pub(crate) use return_default;
}
