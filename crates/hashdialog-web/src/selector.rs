/// Attribute selector matching elements whose `href` equals `hash`.
///
/// Quotes and backslashes are escaped so an arbitrary fragment still
/// yields a valid selector.
pub fn href_selector(hash: &str) -> String {
    let mut out = String::with_capacity(hash.len() + 10);
    out.push_str("[href='");
    for c in hash.chars() {
        match c {
            '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            c => out.push(c),
        }
    }
    out.push_str("']");
    out
}
