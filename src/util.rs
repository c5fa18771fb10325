/// Returns an [`Error::Config`](crate::error::Error::Config) from the enclosing function if a
/// numerical value is not in the interval `[a,b]`
///
/// ### Example
/// ```ignore
/// let learning_rate = 2.0;
/// ensure_interval!(learning_rate, 0.0, 1.0);
/// ```
/// This returns early with the message "invalid value for \`learning_rate\`: 2 is not in the interval \[0, 1\]".
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        // written so that NaN fails the check
        if !($var >= $a && $var <= $b) {
            return Err($crate::error::Error::Config(format!(
                "invalid value for `{}`: {} is not in the interval [{}, {}]",
                stringify!($var),
                $var,
                $a,
                $b,
            )));
        }
    };
}
