// File: request_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#[cfg(test)]
mod tests {
    use crate::errors::ProbeError;
    use crate::request::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const LOGIN_REQUEST: &str = "GET /account HTTP/1.1\r\n\
        Host: shop.example.com\r\n\
        User-Agent: Mozilla/5.0\r\n\
        Cookie: sid=abc; theme=dark; lang=en\r\n\
        Accept: */*\r\n\
        \r\n";

    fn names(cookies: &[Cookie]) -> Vec<&str> {
        cookies.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_parse_request_line_and_headers() {
        let request = HttpRequest::parse(LOGIN_REQUEST.as_bytes()).unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.target(), "/account");
        assert_eq!(request.version(), Some("HTTP/1.1"));
        assert_eq!(request.headers().len(), 4);
        assert_eq!(request.host(), Some("shop.example.com"));
        assert_eq!(request.header("user-agent"), Some("Mozilla/5.0"));
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_extracts_cookies_in_order() {
        let request = HttpRequest::parse(LOGIN_REQUEST.as_bytes()).unwrap();
        let cookies = request.cookies();

        assert_eq!(names(cookies), vec!["sid", "theme", "lang"]);
        assert_eq!(cookies[0].value, "abc");
        assert_eq!(cookies[2].position, 2);
    }

    #[test]
    fn test_round_trip_is_byte_exact() {
        let raw = "POST /login HTTP/1.1\r\n\
            Host: example.com\r\n\
            X-Odd:no-space   \r\n\
            Cookie:a=1;b=2 ;  c=3\r\n\
            Content-Length: 11\r\n\
            \r\n\
            user=admin\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        assert_eq!(request.to_bytes(), raw.as_bytes());
        assert_eq!(request.body(), b"user=admin\n");
    }

    #[test]
    fn test_round_trip_keeps_bare_lf_and_binary_body() {
        let mut raw = b"PUT /blob HTTP/1.0\nHost: example.com\nCookie: k=v\n\n".to_vec();
        raw.extend_from_slice(&[0xff, 0x00, 0xfe]);

        let request = HttpRequest::parse(&raw).unwrap();
        assert_eq!(request.to_bytes(), raw);
        assert_eq!(request.body(), &[0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let once = HttpRequest::parse(LOGIN_REQUEST.as_bytes())
            .unwrap()
            .to_bytes();
        let twice = HttpRequest::parse(&once).unwrap().to_bytes();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_cookies_with_subset_keeps_position() {
        let request = HttpRequest::parse(LOGIN_REQUEST.as_bytes()).unwrap();
        let subset: Vec<Cookie> = request.cookies()[1..].to_vec();

        let mutated = request.with_cookies(&subset);
        let expected = "GET /account HTTP/1.1\r\n\
            Host: shop.example.com\r\n\
            User-Agent: Mozilla/5.0\r\n\
            Cookie: theme=dark; lang=en\r\n\
            Accept: */*\r\n\
            \r\n";
        assert_eq!(String::from_utf8(mutated.to_bytes()).unwrap(), expected);
        assert_eq!(names(mutated.cookies()), vec!["theme", "lang"]);
        assert_eq!(mutated.cookies()[0].position, 0);
    }

    #[test]
    fn test_set_cookies_full_set_reproduces_original() {
        let request = HttpRequest::parse(LOGIN_REQUEST.as_bytes()).unwrap();
        let all = request.cookies().to_vec();
        assert_eq!(request.with_cookies(&all).to_bytes(), LOGIN_REQUEST.as_bytes());
    }

    #[test]
    fn test_set_cookies_empty_removes_header() {
        let request = HttpRequest::parse(LOGIN_REQUEST.as_bytes()).unwrap();
        let mutated = request.with_cookies(&[]);

        let text = String::from_utf8(mutated.to_bytes()).unwrap();
        assert!(!text.to_lowercase().contains("cookie"));
        assert!(mutated.cookies().is_empty());
        assert_eq!(mutated.headers().len(), 3);
        assert!(text.ends_with("Accept: */*\r\n\r\n"));
    }

    #[test]
    fn test_set_cookies_appends_when_missing() {
        let raw = "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        assert!(request.cookies().is_empty());

        let mutated = request.with_cookies(&[Cookie::new("sid", "1", 0)]);
        assert_eq!(
            String::from_utf8(mutated.to_bytes()).unwrap(),
            "GET / HTTP/1.1\r\nHost: example.com\r\nCookie: sid=1\r\n\r\n"
        );
    }

    #[test]
    fn test_set_cookies_uses_request_line_ending() {
        let raw = "GET / HTTP/1.1\nHost: a\nCookie: x=1; y=2\n\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        let mutated = request.with_cookies(&request.cookies()[..1]);
        assert_eq!(
            String::from_utf8(mutated.to_bytes()).unwrap(),
            "GET / HTTP/1.1\nHost: a\nCookie: x=1\n\n"
        );
    }

    #[test]
    fn test_multiple_cookie_headers_merge_into_first() {
        let raw = "GET / HTTP/2\r\n\
            cookie: a=1\r\n\
            host: example.com\r\n\
            cookie: b=2; c=3\r\n\
            \r\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        assert_eq!(names(request.cookies()), vec!["a", "b", "c"]);
        assert_eq!(request.cookies()[2].position, 2);

        let mutated = request.with_cookies(&request.cookies()[1..]);
        assert_eq!(
            String::from_utf8(mutated.to_bytes()).unwrap(),
            "GET / HTTP/2\r\ncookie: b=2; c=3\r\nhost: example.com\r\n\r\n"
        );
    }

    #[test]
    fn test_duplicate_names_are_distinct_entries() {
        let raw = "GET / HTTP/1.1\r\nCookie: id=first; id=second\r\n\r\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        let cookies = request.cookies();

        assert_eq!(cookies.len(), 2);
        assert_ne!(cookies[0], cookies[1]);

        let mutated = request.with_cookies(&cookies[..1]);
        assert!(String::from_utf8(mutated.to_bytes())
            .unwrap()
            .contains("Cookie: id=first\r\n"));
    }

    #[test]
    fn test_bare_and_empty_cookie_segments() {
        let cookies = Cookie::parse_list(" flag ;; k = v ; empty= ;", 0);
        assert_eq!(cookies.len(), 3);
        assert!(cookies[0].is_bare());
        assert_eq!(cookies[0].to_string(), "flag");
        assert_eq!(cookies[1].to_string(), "k=v");
        assert_eq!(cookies[2].to_string(), "empty=");
        assert_eq!(Cookie::join(&cookies), b"flag; k=v; empty=");
    }

    #[test]
    fn test_cookie_value_may_contain_equals() {
        let cookies = Cookie::parse_list("token=a=b==", 0);
        assert_eq!(cookies[0].name, "token");
        assert_eq!(cookies[0].value, "a=b==");
    }

    #[test]
    fn test_non_utf8_cookie_bytes_survive_rewrite() {
        let raw = b"GET / HTTP/1.1\r\nHost: a\r\nCookie: a=caf\xe9; b=2\r\n\r\n";
        let request = HttpRequest::parse(raw).unwrap();
        let all = request.cookies().to_vec();
        assert_eq!(all[0].as_bytes(), b"a=caf\xe9");

        assert_eq!(request.with_cookies(&all).to_bytes(), raw.to_vec());
        assert_eq!(
            request.with_cookies(&all[..1]).to_bytes(),
            b"GET / HTTP/1.1\r\nHost: a\r\nCookie: a=caf\xe9\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn test_cookie_header_with_space_before_colon() {
        let raw = "GET / HTTP/1.1\r\nHost: a\r\nCookie : a=1; b=2\r\n\r\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        assert_eq!(names(request.cookies()), vec!["a", "b"]);
        assert_eq!(request.header("cookie"), Some("a=1; b=2"));

        let rewritten = request.with_cookies(&request.cookies()[1..]).to_bytes();
        assert_eq!(
            String::from_utf8(rewritten).unwrap(),
            "GET / HTTP/1.1\r\nHost: a\r\nCookie: b=2\r\n\r\n"
        );
    }

    #[test]
    fn test_folded_header_belongs_to_previous() {
        let raw = "GET / HTTP/1.1\r\nX-Long: one\r\n two\r\nHost: a\r\n\r\n";
        let request = HttpRequest::parse(raw.as_bytes()).unwrap();
        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.header("x-long"), Some("one two"));
        assert_eq!(request.to_bytes(), raw.as_bytes());
    }

    #[test]
    fn test_request_line_without_version() {
        let request = HttpRequest::parse(b"GET /legacy\r\n\r\n").unwrap();
        assert_eq!(request.version(), None);
        assert_eq!(request.target(), "/legacy");
    }

    #[rstest]
    #[case::empty("")]
    #[case::unterminated("GET / HTTP/1.1\r\nHost: a\r\n")]
    #[case::no_blank_line("GET / HTTP/1.1")]
    #[case::leading_blank("\r\nGET / HTTP/1.1\r\n\r\n")]
    #[case::missing_path("GET\r\n\r\n")]
    #[case::empty_method(" / HTTP/1.1\r\n\r\n")]
    #[case::header_without_colon("GET / HTTP/1.1\r\nHost example.com\r\n\r\n")]
    #[case::empty_header_name("GET / HTTP/1.1\r\n: value\r\n\r\n")]
    #[case::fold_before_header("GET / HTTP/1.1\r\n folded\r\n\r\n")]
    fn test_malformed_requests_are_rejected(#[case] raw: &str) {
        let err = HttpRequest::parse(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)), "unexpected: {}", err);
    }
}
