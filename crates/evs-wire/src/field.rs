/// One parsed line of an event stream.
///
/// Every line maps to exactly one `Field`; nothing is rejected. Values
/// borrow from the line they were parsed from.
///
/// ```text
/// ┌──────────────────────┬───────────────────────────────────────────┐
/// │ Line                 │ Field                                     │
/// ├──────────────────────┼───────────────────────────────────────────┤
/// │ ""                   │ Blank (dispatches the pending event)      │
/// │ ": keep-alive"       │ Comment(" keep-alive")                    │
/// │ "data: hello"        │ Data("hello")                             │
/// │ "data"               │ Data("")                                  │
/// │ "event: update"      │ Event("update")                           │
/// │ "id: 42"             │ Id("42")                                  │
/// │ "retry: 3000"        │ Retry(Some(3000))                         │
/// │ "retry: soon"        │ Retry(None)                               │
/// │ "foo: bar"           │ Unknown { name: "foo", value: "bar" }     │
/// └──────────────────────┴───────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field<'a> {
    Blank,
    Comment(&'a str),
    Data(&'a str),
    Event(&'a str),
    Id(&'a str),
    /// `None` when the value is not a plain run of ASCII digits.
    Retry(Option<u64>),
    Unknown { name: &'a str, value: &'a str },
}

/// Parse a single line (terminator already removed) into a [`Field`].
///
/// The field name runs up to the first `:`. A single space directly
/// after the colon is dropped; any further whitespace is part of the
/// value. A line without a colon is a field name with an empty value.
#[must_use]
pub fn parse_line(line: &str) -> Field<'_> {
    if line.is_empty() {
        return Field::Blank;
    }

    let (name, value) = match line.split_once(':') {
        Some(("", comment)) => return Field::Comment(comment),
        Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };

    match name {
        "data" => Field::Data(value),
        "event" => Field::Event(value),
        "id" => Field::Id(value),
        "retry" => Field::Retry(parse_retry(value)),
        _ => Field::Unknown { name, value },
    }
}

fn parse_retry(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
