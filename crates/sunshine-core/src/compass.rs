//! Compass indicator formatting

/// CSS `transform` value that turns the compass needle by `degrees`
pub fn compass_transform(degrees: f32) -> String {
    format!("rotate({}deg)", degrees)
}
