use super::*;

#[test]
fn thread_titles_pluralize() {
    assert_eq!(
        chart_title("AES Encrypt", VariableMode::Size, 1.0),
        "AES Encrypt on 1 Thread"
    );
    assert_eq!(
        chart_title("AES Encrypt", VariableMode::Size, 4.0),
        "AES Encrypt on 4 Threads"
    );
}

#[test]
fn vector_titles_pick_article() {
    assert_eq!(
        chart_title("AES Encrypt", VariableMode::Threads, 8.0),
        "AES Encrypt on an 8 Bytes Vector"
    );
    assert_eq!(
        chart_title("AES Encrypt", VariableMode::Threads, 64.0),
        "AES Encrypt on a 64 Bytes Vector"
    );
    assert_eq!(
        chart_title("AES Encrypt", VariableMode::Threads, 1.0),
        "AES Encrypt on a 1 Byte Vector"
    );
}

#[test]
fn article_follows_spoken_number() {
    for n in [8.0, 11.0, 18.0, 80.0, 800.0, 8192.0, 18432.0] {
        assert_eq!(indefinite_article(n), "an", "{n}");
    }
    for n in [1.0, 16.0, 64.0, 110.0, 1024.0, 4096.0] {
        assert_eq!(indefinite_article(n), "a", "{n}");
    }
}

#[test]
fn split_half_breaks_past_midpoint() {
    assert_eq!(
        split_half("AES Encrypt on 4 Threads"),
        ("AES Encrypt on", "4 Threads")
    );
    assert_eq!(
        split_half("RSA PKCS Signature on an 8 Bytes Vector"),
        ("RSA PKCS Signature on", "an 8 Bytes Vector")
    );
}

#[test]
fn split_half_single_word() {
    assert_eq!(split_half("Signature"), ("Signature", ""));
    assert_eq!(split_half(""), ("", ""));
}
