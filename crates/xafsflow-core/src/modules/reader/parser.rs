use super::{Delimiter, ReaderOptions};
use crate::domain::{XafsError, XafsResult};
use std::fs;
use std::path::Path;

pub(super) fn read_source(path: &Path) -> XafsResult<String> {
    fs::read_to_string(path).map_err(|source| {
        XafsError::io_system(
            "IO.SPECTRUM_READ",
            format!("failed to read spectrum '{}': {}", path.display(), source),
        )
    })
}

/// Parses the selected columns of `source`, one vector per entry of
/// `options.use_columns`.
pub(super) fn parse_columns(
    path: &Path,
    source: &str,
    options: &ReaderOptions,
) -> XafsResult<Vec<Vec<f64>>> {
    let mut columns = vec![Vec::new(); options.use_columns.len()];
    let required = options.use_columns.iter().copied().max().map_or(0, |max| max + 1);

    for (index, line) in source.lines().enumerate() {
        let content = match options.comment {
            Some(marker) => line.split(marker).next().unwrap_or_default(),
            None => line,
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields = split_fields(trimmed, options.delimiter);
        if fields.len() < required {
            return Err(parse_error(
                path,
                index + 1,
                format!(
                    "expected at least {} fields, found {}",
                    required,
                    fields.len()
                ),
            ));
        }

        for (column, &field_index) in columns.iter_mut().zip(&options.use_columns) {
            let token = fields[field_index];
            let value = parse_numeric_token(token).ok_or_else(|| {
                parse_error(
                    path,
                    index + 1,
                    format!("field {} ('{}') is not a number", field_index, token),
                )
            })?;
            column.push(value);
        }
    }

    Ok(columns)
}

fn split_fields(line: &str, delimiter: Delimiter) -> Vec<&str> {
    match delimiter {
        Delimiter::Whitespace => line.split_whitespace().collect(),
        Delimiter::Char(separator) => line.split(separator).map(str::trim).collect(),
    }
}

fn parse_numeric_token(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(['D', 'd'], "E").parse::<f64>().ok())
}

fn parse_error(path: &Path, line: usize, detail: String) -> XafsError {
    XafsError::input_validation(
        "INPUT.SPECTRUM_PARSE",
        format!("failed to parse spectrum '{}' line {}: {}", path.display(), line, detail),
    )
}

#[cfg(test)]
mod tests {
    use super::parse_columns;
    use crate::modules::reader::{Delimiter, ReaderOptions};
    use std::path::Path;

    #[test]
    fn selects_columns_and_skips_comments() {
        let source = "# header line\n\n7100.0  0.1  0.2  0.30 # trailing\n7100.5 0.1 0.2 0.35\n";
        let columns =
            parse_columns(Path::new("a.nor"), source, &ReaderOptions::default()).expect("parse");
        assert_eq!(columns, vec![vec![7100.0, 7100.5], vec![0.30, 0.35]]);
    }

    #[test]
    fn accepts_fortran_exponents_and_custom_delimiters() {
        let options = ReaderOptions {
            delimiter: Delimiter::Char(','),
            use_columns: vec![0, 1],
            ..ReaderOptions::default()
        };
        let columns = parse_columns(Path::new("a.csv"), "1.5D+03, 2.0\n", &options).expect("parse");
        assert_eq!(columns, vec![vec![1500.0], vec![2.0]]);
    }

    #[test]
    fn short_rows_and_bad_numbers_report_line() {
        let error = parse_columns(
            Path::new("short.nor"),
            "1 2 3 4\n1 2 3\n",
            &ReaderOptions::default(),
        )
        .expect_err("short row");
        assert_eq!(error.placeholder(), "INPUT.SPECTRUM_PARSE");
        assert!(error.message().contains("line 2"));

        let error = parse_columns(
            Path::new("bad.nor"),
            "1 2 3 abc\n",
            &ReaderOptions::default(),
        )
        .expect_err("bad number");
        assert!(error.message().contains("'abc'"));
    }
}
