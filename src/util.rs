/*!

  Helpers for building and testing circuits.

*/

/// Compare Verilog as strings up to indentation.
///
/// Both sides must have the same number of lines.
#[macro_export]
macro_rules! assert_verilog_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                assert_eq!(
                    left_val.lines().count(),
                    right_val.lines().count(),
                    "line counts differ:\n{}\n---\n{}",
                    left_val,
                    right_val
                );
                for (left_line, right_line) in left_val.lines().zip(right_val.lines()) {
                    assert_eq!(left_line.trim(), right_line.trim());
                }
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                assert_eq!(
                    left_val.lines().count(),
                    right_val.lines().count(),
                    $($arg)+
                );
                for (left_line, right_line) in left_val.lines().zip(right_val.lines()) {
                    assert_eq!(left_line.trim(), right_line.trim(), $($arg)+);
                }
            }
        }
    };
}

/// Format a gate name like `format!`
///
/// ```
/// use obelisk_logic::format_id;
/// let i = 3;
/// assert_eq!(format_id!("door{i}").get_name(), "door3");
/// ```
#[macro_export]
macro_rules! format_id {
    ($($arg:tt)*) => {
        $crate::circuit::Identifier::new(format!($($arg)*))
    };
}
