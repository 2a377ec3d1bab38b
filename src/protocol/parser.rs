// src/protocol/parser.rs

//! Request tokenizer.
//!
//! Two request grammars are accepted:
//! - RESP arrays of bulk strings, e.g. `*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n`
//! - plain text lines split on whitespace, e.g. `GET key\r\n` (handy from telnet)
//!
//! RESP parsing is best effort: on a missing `$`, a bad length or a truncated
//! buffer it stops and returns whatever arguments were complete.

/// Splits one request into its argument strings.
pub fn parse_command(input: &[u8]) -> Vec<String> {
    match input.first() {
        None => Vec::new(),
        Some(b'*') => parse_resp_array(input),
        Some(_) => String::from_utf8_lossy(input)
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    }
}

fn parse_resp_array(input: &[u8]) -> Vec<String> {
    let mut tokens = Vec::new();

    // "*<N>\r\n"
    let Some((count, mut pos)) = read_number(input, 1) else {
        return tokens;
    };

    for _ in 0..count {
        if input.get(pos) != Some(&b'$') {
            break;
        }
        let Some((len, data_start)) = read_number(input, pos + 1) else {
            break;
        };
        let Ok(len) = usize::try_from(len) else {
            break;
        };
        let Some(data) = input.get(data_start..data_start + len) else {
            break;
        };
        tokens.push(String::from_utf8_lossy(data).into_owned());
        // skip payload and its trailing CRLF
        pos = data_start + len + 2;
    }
    tokens
}

/// Reads a decimal number starting at `start` and terminated by CRLF.
/// Returns the number and the position just after the CRLF.
fn read_number(input: &[u8], start: usize) -> Option<(i64, usize)> {
    let rest = input.get(start..)?;
    let end = find_crlf(rest)?;
    let text = std::str::from_utf8(&rest[..end]).ok()?;
    let n = text.trim().parse::<i64>().ok()?;
    Some((n, start + end + 2))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Length of the first complete request in `buf`, or `None` if more bytes are needed.
///
/// Used by the transport to cut requests out of a stream. A RESP header that
/// can never become valid reports the whole buffer as one request, so the
/// parser gets to degrade instead of the connection stalling.
pub fn frame_length(buf: &[u8]) -> Option<usize> {
    match buf.first()? {
        b'*' => resp_frame_length(buf),
        _ => buf.iter().position(|b| *b == b'\n').map(|i| i + 1),
    }
}

fn resp_frame_length(buf: &[u8]) -> Option<usize> {
    // header not terminated yet
    find_crlf(&buf[1..])?;
    let Some((count, mut pos)) = read_number(buf, 1) else {
        return Some(buf.len());
    };

    for _ in 0..count.max(0) {
        match buf.get(pos) {
            None => return None,
            Some(b'$') => {}
            Some(_) => return Some(buf.len()),
        }
        find_crlf(buf.get(pos + 1..)?)?;
        let Some((len, data_start)) = read_number(buf, pos + 1) else {
            return Some(buf.len());
        };
        let Ok(len) = usize::try_from(len) else {
            return Some(buf.len());
        };
        let end = data_start + len + 2;
        if buf.len() < end {
            return None;
        }
        pos = end;
    }
    Some(pos)
}
