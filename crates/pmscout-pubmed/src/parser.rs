//! EFetch XML parser using quick-xml
//!
//! Streaming parser for the `PubmedArticleSet` documents returned by efetch.
//! Only the fields the extractor needs are collected; everything else is
//! skipped. A document that ends inside an open element is an error.

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Parsed PubMed article
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PubmedArticle {
    pub pmid: String,
    pub title: Option<String>,
    /// Original-language title, present for translated articles
    pub vernacular_title: Option<String>,
    /// Journal issue date (`JournalIssue/PubDate`)
    pub pub_date: PartialDate,
    /// Electronic publication date (`Article/ArticleDate`)
    pub article_date: PartialDate,
    pub authors: Vec<Author>,
}

/// Date with optional month/day, as PubMed often omits them
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Author {
    pub last_name: Option<String>,
    pub fore_name: Option<String>,
    pub initials: Option<String>,
    pub collective_name: Option<String>,
    pub affiliations: Vec<String>,
}

impl Author {
    /// Display name: "ForeName LastName", falling back to initials, then to the
    /// collective name. `None` when the entry carries no name at all.
    pub fn display_name(&self) -> Option<String> {
        let given = self.fore_name.as_deref().or(self.initials.as_deref());
        match (given, self.last_name.as_deref()) {
            (Some(g), Some(l)) => Some(format!("{g} {l}")),
            (None, Some(l)) => Some(l.to_string()),
            (Some(g), None) => Some(g.to_string()),
            (None, None) => self.collective_name.clone(),
        }
    }
}

/// Parse every `PubmedArticle` in an efetch document.
///
/// Book records (`PubmedBookArticle`) are skipped.
pub fn parse_pubmed_xml(xml: &str) -> Result<Vec<PubmedArticle>> {
    let mut reader = Reader::from_str(xml);
    let mut articles = Vec::new();
    let mut buf = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf).context("XML parse error")? {
            Event::Start(e) => match e.name().as_ref() {
                b"PubmedArticleSet" => saw_root = true,
                b"PubmedArticle" => {
                    let article = parse_article(&mut reader).with_context(|| {
                        format!("malformed PubmedArticle #{}", articles.len() + 1)
                    })?;
                    articles.push(article);
                }
                b"PubmedBookArticle" => skip_element(&mut reader, b"PubmedBookArticle")?,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        bail!("not a PubmedArticleSet document");
    }
    Ok(articles)
}

fn parse_article(reader: &mut Reader<&[u8]>) -> Result<PubmedArticle> {
    let mut article = PubmedArticle::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(reader, &mut article)?,
                // Ids, history and references; nothing the extractor uses
                b"PubmedData" => skip_element(reader, b"PubmedData")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => bail!("document ended inside <PubmedArticle>"),
            _ => {}
        }
        buf.clear();
    }

    if article.pmid.is_empty() {
        bail!("article has no PMID");
    }
    Ok(article)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"PMID" => article.pmid = read_text(reader)?,
                b"Article" => parse_article_element(reader, article)?,
                // These carry their own PMIDs and affiliations
                b"CommentsCorrectionsList" => skip_element(reader, b"CommentsCorrectionsList")?,
                b"InvestigatorList" => skip_element(reader, b"InvestigatorList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => bail!("document ended inside <MedlineCitation>"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Journal" => parse_journal(reader, article)?,
                b"ArticleTitle" => {
                    article.title = non_empty(read_text_content(reader, b"ArticleTitle")?)
                }
                b"VernacularTitle" => {
                    article.vernacular_title =
                        non_empty(read_text_content(reader, b"VernacularTitle")?)
                }
                b"AuthorList" => article.authors = parse_author_list(reader)?,
                b"ArticleDate" => article.article_date = read_date(reader, b"ArticleDate")?,
                b"Abstract" => skip_element(reader, b"Abstract")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => bail!("document ended inside <Article>"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PubDate" => {
                article.pub_date = read_date(reader, b"PubDate")?;
            }
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => bail!("document ended inside <Journal>"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read `Year`/`Month`/`Day` (or a free-text `MedlineDate`) up to `end_tag`.
fn read_date(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<PartialDate> {
    let mut buf = Vec::new();
    let mut date = PartialDate::default();
    let mut medline_date = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = read_text(reader)?.parse().ok(),
                b"Month" => date.month = parse_month(&read_text(reader)?),
                b"Day" => date.day = read_text(reader)?.parse().ok().filter(|d| (1..=31).contains(d)),
                b"MedlineDate" => medline_date = Some(read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == end_tag => break,
            Event::Eof => bail!("document ended inside date element"),
            _ => {}
        }
        buf.clear();
    }

    if date.year.is_none() {
        if let Some(text) = medline_date {
            date = parse_medline_date(&text);
        }
    }
    Ok(date)
}

/// Free-text dates such as "1998 Dec-1999 Jan", "2000 Spring", "2019 Mar-Apr".
///
/// Keeps the leading year and, if it names one, the leading month.
fn parse_medline_date(text: &str) -> PartialDate {
    let mut parts = text.split_whitespace();
    let year = parts
        .next()
        .and_then(|y| y.get(..4))
        .and_then(|y| y.parse::<i32>().ok());
    let month = year
        .and(parts.next())
        .and_then(|m| m.split('-').next())
        .and_then(parse_month);
    PartialDate {
        year,
        month,
        day: None,
    }
}

fn parse_month(s: &str) -> Option<u32> {
    // Handle both numeric and text months
    let s = s.trim();
    if let Ok(n) = s.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix = s.get(..3)?.to_ascii_lowercase();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

fn parse_author_list(reader: &mut Reader<&[u8]>) -> Result<Vec<Author>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                authors.push(parse_author(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => bail!("document ended inside <AuthorList>"),
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<Author> {
    let mut author = Author::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => author.last_name = non_empty(read_text(reader)?),
                b"ForeName" => author.fore_name = non_empty(read_text(reader)?),
                b"Initials" => author.initials = non_empty(read_text(reader)?),
                b"CollectiveName" => {
                    author.collective_name = non_empty(read_text_content(reader, b"CollectiveName")?)
                }
                b"AffiliationInfo" => {
                    if let Some(aff) = parse_affiliation(reader)? {
                        author.affiliations.push(aff);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => bail!("document ended inside <Author>"),
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_affiliation(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut affiliation = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Affiliation" => {
                affiliation = non_empty(read_text_content(reader, b"Affiliation")?);
            }
            Event::End(e) if e.name().as_ref() == b"AffiliationInfo" => break,
            Event::Eof => bail!("document ended inside <AffiliationInfo>"),
            _ => {}
        }
        buf.clear();
    }

    Ok(affiliation)
}

fn skip_element(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => bail!(
                "document ended inside <{}>",
                String::from_utf8_lossy(end_tag)
            ),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read the text of a leaf element (no nested markup expected)
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => break,
            Event::Start(_) => {
                // Nested markup inside a leaf; keep its text
                text.push_str(&read_text(reader)?);
            }
            Event::Eof => bail!("document ended inside text element"),
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

/// Read the text of `end_tag`, flattening inline markup (`<i>`, `<sup>`, ...)
/// and collapsing whitespace runs.
fn read_text_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => bail!(
                "document ended inside <{}>",
                String::from_utf8_lossy(end_tag)
            ),
            _ => {}
        }
        buf.clear();
    }

    Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="PubMed-not-MEDLINE" Owner="NLM">
      <PMID Version="1">222</PMID>
      <Article PubModel="Print-Electronic">
        <Journal>
          <ISSN IssnType="Electronic">1234-5678</ISSN>
          <JournalIssue CitedMedium="Internet">
            <Volume>12</Volume>
            <PubDate>
              <Year>2024</Year>
              <Month>Mar</Month>
              <Day>05</Day>
            </PubDate>
          </JournalIssue>
          <Title>Journal of Testing</Title>
        </Journal>
        <ArticleTitle>Novel CAR-T Approach</ArticleTitle>
        <Abstract>
          <AbstractText>Background text with an <i>Affiliation</i> word.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y">
            <LastName>Smith</LastName>
            <ForeName>Jane</ForeName>
            <Initials>J</Initials>
            <AffiliationInfo>
              <Affiliation>Department of Oncology, Harvard University, Boston, MA, USA.</Affiliation>
            </AffiliationInfo>
          </Author>
          <Author ValidYN="Y">
            <LastName>Doe</LastName>
            <Initials>JD</Initials>
            <AffiliationInfo>
              <Affiliation>Acme Pharma Inc., Cambridge, MA, USA.</Affiliation>
            </AffiliationInfo>
            <AffiliationInfo>
              <Affiliation>Second site &amp; lab.</Affiliation>
            </AffiliationInfo>
          </Author>
        </AuthorList>
        <ArticleDate DateType="Electronic">
          <Year>2024</Year>
          <Month>01</Month>
          <Day>20</Day>
        </ArticleDate>
      </Article>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="CommentIn">
          <RefSource>Other J. 2024</RefSource>
          <PMID Version="1">999</PMID>
        </CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">222</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn parse_basic_article() {
        let articles = parse_pubmed_xml(SAMPLE_XML).unwrap();
        assert_eq!(articles.len(), 1);

        let article = &articles[0];
        assert_eq!(article.pmid, "222");
        assert_eq!(article.title.as_deref(), Some("Novel CAR-T Approach"));
        assert!(article.vernacular_title.is_none());
    }

    #[test]
    fn comment_pmid_does_not_override_article_pmid() {
        let articles = parse_pubmed_xml(SAMPLE_XML).unwrap();
        assert_eq!(articles[0].pmid, "222");
    }

    #[test]
    fn parse_dates() {
        let article = &parse_pubmed_xml(SAMPLE_XML).unwrap()[0];
        assert_eq!(
            article.pub_date,
            PartialDate {
                year: Some(2024),
                month: Some(3),
                day: Some(5)
            }
        );
        assert_eq!(article.article_date.month, Some(1));
        assert_eq!(article.article_date.day, Some(20));
    }

    #[test]
    fn parse_authors_and_affiliations() {
        let article = &parse_pubmed_xml(SAMPLE_XML).unwrap()[0];
        assert_eq!(article.authors.len(), 2);
        assert_eq!(article.authors[0].display_name().as_deref(), Some("Jane Smith"));
        assert_eq!(article.authors[1].display_name().as_deref(), Some("JD Doe"));
        assert_eq!(
            article.authors[1].affiliations,
            vec!["Acme Pharma Inc., Cambridge, MA, USA.", "Second site & lab."]
        );
    }

    #[test]
    fn title_with_inline_markup_keeps_spacing() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>1</PMID>
            <Article><ArticleTitle>Effect of <i>E. coli</i> on CD8<sup>+</sup> T
               cells.</ArticleTitle></Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let article = &parse_pubmed_xml(xml).unwrap()[0];
        assert_eq!(
            article.title.as_deref(),
            Some("Effect of E. coli on CD8+ T cells.")
        );
    }

    #[test]
    fn vernacular_title_and_empty_english_title() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>2</PMID>
            <Article>
              <ArticleTitle></ArticleTitle>
              <VernacularTitle>Étude des anticorps monoclonaux</VernacularTitle>
            </Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let article = &parse_pubmed_xml(xml).unwrap()[0];
        assert!(article.title.is_none());
        assert_eq!(
            article.vernacular_title.as_deref(),
            Some("Étude des anticorps monoclonaux")
        );
    }

    #[test]
    fn collective_author() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>3</PMID>
            <Article><AuthorList>
              <Author><CollectiveName>CAR-T Study Group</CollectiveName></Author>
            </AuthorList></Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let article = &parse_pubmed_xml(xml).unwrap()[0];
        assert_eq!(
            article.authors[0].display_name().as_deref(),
            Some("CAR-T Study Group")
        );
    }

    #[test]
    fn investigators_are_not_authors() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>4</PMID>
            <Article><AuthorList>
              <Author><LastName>Lee</LastName><ForeName>Min</ForeName></Author>
            </AuthorList></Article>
            <InvestigatorList>
              <Investigator><LastName>Other</LastName>
                <AffiliationInfo><Affiliation>Globex Corp.</Affiliation></AffiliationInfo>
              </Investigator>
            </InvestigatorList>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let article = &parse_pubmed_xml(xml).unwrap()[0];
        assert_eq!(article.authors.len(), 1);
        assert!(article.authors[0].affiliations.is_empty());
    }

    #[test]
    fn medline_date_keeps_year_and_leading_month() {
        assert_eq!(
            parse_medline_date("1998 Dec-1999 Jan"),
            PartialDate {
                year: Some(1998),
                month: Some(12),
                day: None
            }
        );
        assert_eq!(parse_medline_date("2000 Spring").month, None);
        assert_eq!(parse_medline_date("2000 Spring").year, Some(2000));
        assert_eq!(parse_medline_date("garbage").year, None);
    }

    #[test]
    fn medline_date_in_pub_date() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>5</PMID>
            <Article><Journal><JournalIssue><PubDate>
              <MedlineDate>2019 Mar-Apr</MedlineDate>
            </PubDate></JournalIssue></Journal></Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let article = &parse_pubmed_xml(xml).unwrap()[0];
        assert_eq!(article.pub_date.year, Some(2019));
        assert_eq!(article.pub_date.month, Some(3));
    }

    #[test]
    fn parse_month_variants() {
        assert_eq!(parse_month("06"), Some(6));
        assert_eq!(parse_month("Jun"), Some(6));
        assert_eq!(parse_month("September"), Some(9));
        assert_eq!(parse_month("13"), None);
        assert_eq!(parse_month("Winter"), None);
        assert_eq!(parse_month(""), None);
    }

    #[test]
    fn parse_multiple_articles_in_document_order() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle><MedlineCitation><PMID>2</PMID></MedlineCitation></PubmedArticle>
  <PubmedBookArticle><BookDocument><PMID>7</PMID></BookDocument></PubmedBookArticle>
  <PubmedArticle><MedlineCitation><PMID>1</PMID></MedlineCitation></PubmedArticle>
</PubmedArticleSet>"#;
        let articles = parse_pubmed_xml(xml).unwrap();
        let pmids: Vec<&str> = articles.iter().map(|a| a.pmid.as_str()).collect();
        assert_eq!(pmids, vec!["2", "1"]);
    }

    #[test]
    fn parse_empty_set() {
        let xml = r#"<?xml version="1.0"?>
<PubmedArticleSet>
</PubmedArticleSet>"#;
        assert!(parse_pubmed_xml(xml).unwrap().is_empty());
    }

    #[test]
    fn truncated_document_fails() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>1</PMID><Article>";
        assert!(parse_pubmed_xml(xml).is_err());
    }

    #[test]
    fn mismatched_tags_fail() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>1</Title></MedlineCitation></PubmedArticle></PubmedArticleSet>";
        assert!(parse_pubmed_xml(xml).is_err());
    }

    #[test]
    fn non_pubmed_document_fails() {
        assert!(parse_pubmed_xml("<html><body>Error</body></html>").is_err());
        assert!(parse_pubmed_xml("").is_err());
    }

    #[test]
    fn article_without_pmid_fails() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation></MedlineCitation></PubmedArticle></PubmedArticleSet>";
        assert!(parse_pubmed_xml(xml).is_err());
    }
}
