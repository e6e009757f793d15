//! Sheet-name → range quoting.
//!
//! The values endpoints address a sheet through a range string in the URL
//! path. Two forms are supported (see [`RangeQuoting`]):
//!
//! - `Utf16Form`: form-encoding over UTF-16, where `A-Z a-z 0-9 . - * _` pass
//!   through, a space becomes `+`, and each run of other characters is
//!   written as UTF-16 (with a `FE FF` byte-order mark) in `%XX` bytes.
//!   This is the default.
//! - `A1`: the sheet name in single quotes with embedded quotes doubled.
//!
//! Either form is then percent-encoded once more as a path segment.

use sheetdraft_config::RangeQuoting;

/// Quote a sheet name into a range string.
pub fn quote_sheet_name(sheet_name: &str, quoting: RangeQuoting) -> String {
    match quoting {
        RangeQuoting::Utf16Form => utf16_form_encode(sheet_name),
        RangeQuoting::A1 => format!("'{}'", sheet_name.replace('\'', "''")),
    }
}

/// Quote a sheet name and escape it for use as one URL path segment.
pub fn range_path_segment(sheet_name: &str, quoting: RangeQuoting) -> String {
    urlencoding::encode(&quote_sheet_name(sheet_name, quoting)).into_owned()
}

fn passes_through(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '*' | '_' | ' ')
}

fn utf16_form_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut run = String::new();

    for c in input.chars() {
        if passes_through(c) {
            flush_run(&mut run, &mut out);
            out.push(if c == ' ' { '+' } else { c });
        } else {
            run.push(c);
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut String, out: &mut String) {
    if run.is_empty() {
        return;
    }
    // Each run is encoded on its own and so carries its own byte-order mark.
    out.push_str("%FE%FF");
    for unit in run.encode_utf16() {
        for byte in unit.to_be_bytes() {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_pass_through() {
        assert_eq!(quote_sheet_name("Sheet1", RangeQuoting::Utf16Form), "Sheet1");
        assert_eq!(
            quote_sheet_name("q1_report-v2.final*", RangeQuoting::Utf16Form),
            "q1_report-v2.final*"
        );
    }

    #[test]
    fn space_becomes_plus() {
        assert_eq!(quote_sheet_name("My Sheet", RangeQuoting::Utf16Form), "My+Sheet");
    }

    #[test]
    fn non_ascii_runs_get_utf16_escapes() {
        // Л=041B и=0438 с=0441 т=0442
        assert_eq!(
            quote_sheet_name("Лист 1", RangeQuoting::Utf16Form),
            "%FE%FF%04%1B%04%38%04%41%04%42+1"
        );
    }

    #[test]
    fn each_run_has_its_own_bom() {
        assert_eq!(
            quote_sheet_name("a/b/c", RangeQuoting::Utf16Form),
            "a%FE%FF%00%2Fb%FE%FF%00%2Fc"
        );
    }

    #[test]
    fn astral_characters_use_surrogate_pairs() {
        // U+1F4CA → D83D DCCA
        assert_eq!(
            quote_sheet_name("📊", RangeQuoting::Utf16Form),
            "%FE%FF%D8%3D%DC%CA"
        );
    }

    #[test]
    fn a1_quoting_doubles_apostrophes() {
        assert_eq!(quote_sheet_name("Bob's", RangeQuoting::A1), "'Bob''s'");
        assert_eq!(quote_sheet_name("Sheet1", RangeQuoting::A1), "'Sheet1'");
    }

    #[test]
    fn path_segment_escapes_the_quoted_form() {
        assert_eq!(range_path_segment("My Sheet", RangeQuoting::Utf16Form), "My%2BSheet");
        assert_eq!(range_path_segment("a/b", RangeQuoting::Utf16Form), "a%25FE%25FF%2500%252Fb");
        assert_eq!(range_path_segment("My Sheet", RangeQuoting::A1), "%27My%20Sheet%27");
    }
}
