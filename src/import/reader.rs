//! Pull-based CSV decoding of `Person` rows.
//!
//! The reader is a finite, non-restartable sequence: the caller pulls with
//! [`PersonReader::next_record`] until it yields `None` or an error. Reads only
//! happen when the caller asks for the next row, so a slow consumer never makes
//! the reader buffer more than one CSV block ahead.

use crate::error::{ImportError, ParseError, ParseErrorKind};
use crate::models::{PERSON_COLUMNS, Person};
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord, Trim};
use tokio::io::AsyncRead;

/// Position of each `Person` field within a CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    name: usize,
    surname: usize,
    initials: usize,
    age: usize,
    date_of_birth: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, ParseError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}'))
            .collect();

        if names.len() != PERSON_COLUMNS.len() {
            return Err(ParseError::header(format!(
                "expected columns {}, found {}",
                PERSON_COLUMNS.join(","),
                names.join(",")
            )));
        }

        let position = |column: &str| {
            names
                .iter()
                .position(|header| *header == column)
                .ok_or_else(|| ParseError::header(format!("missing column '{}'", column)))
        };

        Ok(Self {
            name: position("name")?,
            surname: position("surname")?,
            initials: position("initials")?,
            age: position("age")?,
            date_of_birth: position("date_of_birth")?,
        })
    }
}

/// Streams `Person` values out of CSV text.
pub struct PersonReader<R> {
    csv: AsyncReader<R>,
    columns: ColumnMap,
    record: StringRecord,
}

impl<R> PersonReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read and validate the header row.
    ///
    /// A stream with no header at all is reported as `NoInputProvided`; a
    /// header naming anything other than the five `people` columns is a parse
    /// error.
    pub async fn new(reader: R) -> Result<Self, ImportError> {
        let mut csv = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(Trim::All)
            .create_reader(reader);

        let headers = csv.headers().await.map_err(ParseError::from)?;
        if headers.is_empty() {
            return Err(ImportError::NoInputProvided);
        }
        let columns = ColumnMap::from_headers(headers)?;

        Ok(Self {
            csv,
            columns,
            record: StringRecord::new(),
        })
    }

    /// Pull the next row, or `None` once the stream is exhausted.
    pub async fn next_record(&mut self) -> Result<Option<Person>, ParseError> {
        if !self.csv.read_record(&mut self.record).await? {
            return Ok(None);
        }

        let line = self.record.position().map(|pos| pos.line());
        let field = |idx: usize| self.record.get(idx).unwrap_or_default();

        let age_field = field(self.columns.age);
        let age = age_field.parse::<i32>().map_err(|_| {
            ParseError::new(line, ParseErrorKind::InvalidAge(age_field.to_string()))
        })?;

        Ok(Some(Person {
            name: field(self.columns.name).to_string(),
            surname: field(self.columns.surname).to_string(),
            initials: field(self.columns.initials).to_string(),
            age,
            date_of_birth: field(self.columns.date_of_birth).to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_all(input: &str) -> Result<Vec<Person>, ImportError> {
        let mut reader = PersonReader::new(input.as_bytes()).await?;
        let mut people = Vec::new();
        while let Some(person) = reader.next_record().await? {
            people.push(person);
        }
        Ok(people)
    }

    #[tokio::test]
    async fn test_reads_rows_in_order() {
        let input = "name,surname,initials,age,date_of_birth\n\
                     Ada,Lovelace,A,36,10/12/1815\n\
                     Alan,Turing,AM,41,23/06/1912\n";

        let people = read_all(input).await.expect("valid csv");
        assert_eq!(people.len(), 2);
        assert_eq!(people[0], Person::new("Ada", "Lovelace", "A", 36, "10/12/1815"));
        assert_eq!(people[1].surname, "Turing");
    }

    #[tokio::test]
    async fn test_header_order_drives_mapping() {
        let input = "age,date_of_birth,initials,surname,name\n\
                     36,10/12/1815,A,Lovelace,Ada\n";

        let people = read_all(input).await.expect("valid csv");
        assert_eq!(people, vec![Person::new("Ada", "Lovelace", "A", 36, "10/12/1815")]);
    }

    #[tokio::test]
    async fn test_fields_are_trimmed() {
        let input = "name, surname ,initials,age,date_of_birth\r\n\
                     \x20Grace , Hopper,GB, 85 ,09/12/1906\r\n";

        let people = read_all(input).await.expect("valid csv");
        assert_eq!(people[0], Person::new("Grace", "Hopper", "GB", 85, "09/12/1906"));
    }

    #[tokio::test]
    async fn test_missing_column_is_parse_error() {
        let input = "name,surname,initials,age,date_of_birth\n\
                     Ada,Lovelace,A,36,10/12/1815\n\
                     Alan,Turing,AM,41\n";

        match read_all(input).await {
            Err(ImportError::Parse(err)) => {
                assert_eq!(err.kind, ParseErrorKind::FieldCount { expected: 5, found: 4 });
                assert_eq!(err.line, Some(3));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_integer_age_is_parse_error() {
        let input = "name,surname,initials,age,date_of_birth\nAda,Lovelace,A,old,10/12/1815\n";

        match read_all(input).await {
            Err(ImportError::Parse(err)) => {
                assert_eq!(err.kind, ParseErrorKind::InvalidAge("old".to_string()));
                assert_eq!(err.line, Some(2));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_header_is_rejected() {
        let input = "first,last,initials,age,dob\nAda,Lovelace,A,36,10/12/1815\n";
        assert!(matches!(
            read_all(input).await,
            Err(ImportError::Parse(ParseError {
                kind: ParseErrorKind::Header(_),
                ..
            }))
        ));

        let input = "name,surname,initials,age\nAda,Lovelace,A,36\n";
        assert!(matches!(read_all(input).await, Err(ImportError::Parse(_))));
    }

    #[tokio::test]
    async fn test_empty_stream_is_no_input() {
        assert!(matches!(read_all("").await, Err(ImportError::NoInputProvided)));
    }

    #[tokio::test]
    async fn test_blank_header_fields_are_parse_error() {
        match read_all(",,,,\nAda,Lovelace,A,36,10/12/1815\n").await {
            Err(ImportError::Parse(err)) => {
                assert!(matches!(err.kind, ParseErrorKind::Header(_)));
                assert_eq!(err.line, Some(1));
            }
            other => panic!("expected header error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_header_only_yields_nothing() {
        let people = read_all("name,surname,initials,age,date_of_birth\n")
            .await
            .expect("header only is valid");
        assert!(people.is_empty());
    }
}
