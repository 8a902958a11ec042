/// Builds the "verb target" line shown under the scene.
///
/// Either half may be empty; the result never carries a dangling separator.
pub fn compose_info_line(verb: &str, mouseover: &str) -> String {
    format!("{verb} {mouseover}").trim().to_string()
}
