/// Turns a listing title into a URL-safe slug. Alphanumerics are lowercased and every other run of characters
/// collapses into a single hyphen, so "Advanced Rust: Async & Beyond!" becomes "advanced-rust-async-beyond".
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                slug.push(lc);
            }
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
