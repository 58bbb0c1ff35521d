use thiserror::Error;
use uuid::Uuid;

/// Number of fields every index listing line must carry
const FIELDS_PER_LINE: usize = 19;

/// One parsed entry from a feed index listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    /// Channel identifier, nil when the feed carries none
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub desc: String,
    pub genre: String,
    /// Playback URL
    pub url: String,
    /// Contact/origin URL
    pub tip: String,
    /// Preformatted uptime text, passed through as is
    pub uptime: String,
    /// Kbps
    pub bitrate: i32,
    /// Listeners connected directly, as self-reported by the origin.
    /// Feeds are untrusted and negative values do occur.
    pub num_directs: i32,
    /// Listeners connected through relaying peers
    pub num_relays: i32
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("parse error at line {line}")]
pub struct ParseError {
    pub line: usize
}

impl ChannelRecord {
    // Positions in a 19 field index line:
    // 0 name, 1 id, 2 tip, 3 url, 4 genre, 5 desc, 6 directs, 7 relays,
    // 8 bitrate, 9 content type, 15 uptime, the rest are reserved
    fn from_fields(fields: &[&str]) -> Self {
        Self {
            name: fields[0].to_owned(),
            id: Uuid::try_parse(fields[1]).unwrap_or_default(),
            tip: fields[2].to_owned(),
            url: fields[3].to_owned(),
            genre: fields[4].to_owned(),
            desc: fields[5].to_owned(),
            num_directs: parse_int(fields[6]),
            num_relays: parse_int(fields[7]),
            bitrate: parse_int(fields[8]),
            content_type: fields[9].to_owned(),
            uptime: fields[15].to_owned()
        }
    }
}

fn parse_int(s: &str) -> i32 {
    s.parse().unwrap_or(0)
}

/// Parse a whole feed response into records, one per non-empty line.
/// A line that does not split into exactly 19 fields voids the whole
/// feed, there is no partial success.
pub fn parse_records(text: &str) -> Result<Vec<ChannelRecord>, ParseError> {
    let mut records = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let fields = line.split("<>").collect::<Vec<&str>>();
        if fields.len() != FIELDS_PER_LINE {
            return Err(ParseError { line: lineno + 1 });
        }

        records.push(ChannelRecord::from_fields(&fields));
    }

    Ok(records)
}

/// Channel detail fields addressable from page templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelField {
    Name,
    Id,
    Bitrate,
    ContentType,
    Desc,
    Genre,
    Url,
    Tip,
    Uptime,
    NumDirects,
    NumRelays
}

impl ChannelField {
    /// Map a template variable name to a field, None when unrecognized
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "id" => Some(Self::Id),
            "bitrate" => Some(Self::Bitrate),
            "contentTypeStr" => Some(Self::ContentType),
            "desc" => Some(Self::Desc),
            "genre" => Some(Self::Genre),
            "url" => Some(Self::Url),
            "tip" => Some(Self::Tip),
            "uptime" => Some(Self::Uptime),
            "numDirects" => Some(Self::NumDirects),
            "numRelays" => Some(Self::NumRelays),
            _ => None
        }
    }

    /// Render the field of a record as display text
    pub fn render(&self, ch: &ChannelRecord) -> String {
        match self {
            Self::Name => ch.name.clone(),
            Self::Id => format!("{:X}", ch.id.simple()),
            Self::Bitrate => ch.bitrate.to_string(),
            Self::ContentType => ch.content_type.clone(),
            Self::Desc => ch.desc.clone(),
            Self::Genre => ch.genre.clone(),
            Self::Url => ch.url.clone(),
            Self::Tip => ch.tip.clone(),
            Self::Uptime => ch.uptime.clone(),
            Self::NumDirects => ch.num_directs.to_string(),
            Self::NumRelays => ch.num_relays.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_records, ChannelField, ParseError};
    use uuid::Uuid;

    fn line(name: &str, id: &str, directs: &str, relays: &str, bitrate: &str) -> String {
        [
            name, id, "192.0.2.1:7144", "http://example.com/ch", "Music",
            "A test channel", directs, relays, bitrate, "MP3",
            "", "", "", "", "", "1:23", "", "", ""
        ].join("<>")
    }

    #[test]
    fn well_formed_lines() {
        let text = format!(
            "{}\n{}\n",
            line("First", "0123456789ABCDEF0123456789ABCDEF", "5", "2", "128"),
            line("Second", "00000000000000000000000000000000", "20", "0", "320")
        );
        let records = parse_records(&text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "First");
        assert_eq!(
            records[0].id,
            Uuid::try_parse("0123456789ABCDEF0123456789ABCDEF").unwrap()
        );
        assert_eq!(records[0].tip, "192.0.2.1:7144");
        assert_eq!(records[0].url, "http://example.com/ch");
        assert_eq!(records[0].genre, "Music");
        assert_eq!(records[0].desc, "A test channel");
        assert_eq!(records[0].num_directs, 5);
        assert_eq!(records[0].num_relays, 2);
        assert_eq!(records[0].bitrate, 128);
        assert_eq!(records[0].content_type, "MP3");
        assert_eq!(records[0].uptime, "1:23");
        assert_eq!(records[1].name, "Second");
        assert!(records[1].id.is_nil());
    }

    #[test]
    fn wrong_field_count_fails_with_line_number() {
        let good = line("Ok", "00000000000000000000000000000000", "1", "0", "64");
        let text = format!("{}\nonly<>four<>fields<>here\n", good);
        assert_eq!(parse_records(&text), Err(ParseError { line: 2 }));

        // one field too many
        let text = format!("{}<>extra\n", good);
        assert_eq!(parse_records(&text), Err(ParseError { line: 1 }));
    }

    #[test]
    fn blank_lines_skipped_but_numbered() {
        let good = line("Ok", "00000000000000000000000000000000", "1", "0", "64");
        let text = format!("{}\n\nbroken\n", good);
        assert_eq!(parse_records(&text), Err(ParseError { line: 3 }));

        let text = format!("{}\n\n\n", good);
        assert_eq!(parse_records(&text).unwrap().len(), 1);
    }

    #[test]
    fn defensive_numeric_defaults() {
        let text = line("Odd", "zzz", "many", "-3", "abc");
        let records = parse_records(&text).unwrap();
        assert!(records[0].id.is_nil());
        assert_eq!(records[0].num_directs, 0);
        assert_eq!(records[0].num_relays, -3);
        assert_eq!(records[0].bitrate, 0);
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_records("").unwrap().len(), 0);
        assert_eq!(parse_records("\n\n").unwrap().len(), 0);
    }

    #[test]
    fn field_name_table() {
        for name in [
            "name", "id", "bitrate", "contentTypeStr", "desc", "genre",
            "url", "tip", "uptime", "numDirects", "numRelays"
        ] {
            assert!(ChannelField::from_name(name).is_some(), "{name}");
        }
        assert!(ChannelField::from_name("Name").is_none());
        assert!(ChannelField::from_name("contenttypestr").is_none());
        assert!(ChannelField::from_name("").is_none());
    }

    #[test]
    fn field_rendering() {
        let text = line("Chan", "0123456789abcdef0123456789abcdef", "7", "3", "192");
        let ch = &parse_records(&text).unwrap()[0];

        assert_eq!(ChannelField::Name.render(ch), "Chan");
        assert_eq!(ChannelField::Id.render(ch), "0123456789ABCDEF0123456789ABCDEF");
        assert_eq!(ChannelField::NumDirects.render(ch), "7");
        assert_eq!(ChannelField::NumRelays.render(ch), "3");
        assert_eq!(ChannelField::Bitrate.render(ch), "192");
        assert_eq!(ChannelField::Uptime.render(ch), "1:23");
    }
}
