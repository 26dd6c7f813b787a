//! Turns raw video titles into song search queries.
//!
//! Video titles usually look like `Artist - Song (Official Video) [HD]`. The
//! song name is the useful part for a catalog search, so the bracketed noise,
//! the artist prefix and a fixed list of marketing words are dropped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bracketed or parenthesized segments, matched lazily and without nesting.
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]|\(.*?\)").unwrap());

/// Separators between the artist and song parts of a title.
static DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-:–—|]").unwrap());

static STOPWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(official|video|lyrics?|audio|remastered|live|hd|hq|full album|feat\.?|ft\.?)\b",
    )
    .unwrap()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Derive a song query from a video title.
///
/// Returns an empty string when nothing searchable is left, e.g. for a title
/// made only of stopwords. Edge trimming keeps Unicode letters and digits,
/// not only ASCII ones.
pub fn song_query(title: &str) -> String {
    let title = BRACKETED.replace_all(title, "");

    // Everything after the first delimiter is taken to be the song.
    let song = DELIMITER.splitn(&title, 2).nth(1).unwrap_or(&title[..]);

    let song = STOPWORDS.replace_all(song, "");
    let song = song.trim_matches(|c: char| !c.is_alphanumeric());

    WHITESPACE.replace_all(song, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_brackets_and_artist() {
        assert_eq!(
            song_query("Queen - Bohemian Rhapsody (Official Video Remastered)"),
            "Bohemian Rhapsody"
        );
        assert_eq!(song_query("Adele - Hello [Official Lyric Video]"), "Hello");
    }

    #[test]
    fn test_delimiter_variants() {
        assert_eq!(song_query("Daft Punk | Get Lucky"), "Get Lucky");
        assert_eq!(song_query("Röyksopp – Eple"), "Eple");
        assert_eq!(song_query("Artist — Song"), "Song");
        assert_eq!(song_query("Artist: Song"), "Song");
    }

    #[test]
    fn test_only_first_delimiter_splits() {
        assert_eq!(song_query("Artist - Song - Extended"), "Song - Extended");
    }

    #[test]
    fn test_no_delimiter_keeps_whole_title() {
        assert_eq!(song_query("Song Name"), "Song Name");
        assert_eq!(song_query("AC/DC Back In Black HD"), "AC/DC Back In Black");
    }

    #[test]
    fn test_stopwords_are_case_insensitive() {
        assert_eq!(song_query("Artist - Song OFFICIAL AUDIO"), "Song");
        assert_eq!(song_query("Artist - Song Lyrics HQ"), "Song");
        assert_eq!(song_query("Artist - Song Full Album"), "Song");
        assert_eq!(song_query("Artist - Song feat Someone"), "Song Someone");
    }

    #[test]
    fn test_stopwords_match_whole_words_only() {
        assert_eq!(song_query("Pearl Jam - Alive (Live)"), "Alive");
        assert_eq!(song_query("Artist - Videotape"), "Videotape");
    }

    #[test]
    fn test_trims_punctuation_and_collapses_whitespace() {
        assert_eq!(song_query("Artist - \"Quoted Song\"!"), "Quoted Song");
        assert_eq!(
            song_query("Artist -   Many    Spaced   Words  "),
            "Many Spaced Words"
        );
    }

    #[test]
    fn test_keeps_non_ascii_letters() {
        assert_eq!(song_query("Sigur Rós - Hoppípolla"), "Hoppípolla");
        assert_eq!(song_query("Artist - Café"), "Café");
    }

    #[test]
    fn test_noise_only_title_is_empty() {
        assert_eq!(song_query("Official Video"), "");
        assert_eq!(song_query("[HD] (Live)"), "");
        assert_eq!(song_query(""), "");
    }
}
