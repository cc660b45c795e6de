use pmscout_pubmed::{HeuristicClassifier, extract, parse_pubmed_xml};

/// efetch-shaped document with `n` articles of 8 authors each
fn synthetic_document(n: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<PubmedArticleSet>\n");
    for i in 0..n {
        xml.push_str(&format!(
            "<PubmedArticle><MedlineCitation Status=\"MEDLINE\" Owner=\"NLM\">\
             <PMID Version=\"1\">{}</PMID><Article>\
             <Journal><JournalIssue><PubDate><Year>2024</Year><Month>Mar</Month><Day>5</Day></PubDate></JournalIssue></Journal>\
             <ArticleTitle>Checkpoint blockade study <i>number</i> {i}.</ArticleTitle>\
             <AuthorList CompleteYN=\"Y\">",
            30_000_000 + i
        ));
        for a in 0..8 {
            let affiliation = if a % 3 == 0 {
                format!("Acme Pharma Inc., Cambridge, MA, USA. Electronic address: author{a}@acme.com.")
            } else {
                "Department of Oncology, Harvard University, Boston, MA, USA.".to_string()
            };
            xml.push_str(&format!(
                "<Author ValidYN=\"Y\"><LastName>Author{a}</LastName><ForeName>Test</ForeName>\
                 <Initials>T</Initials><AffiliationInfo><Affiliation>{affiliation}</Affiliation></AffiliationInfo></Author>"
            ));
        }
        xml.push_str("</AuthorList></Article></MedlineCitation></PubmedArticle>\n");
    }
    xml.push_str("</PubmedArticleSet>\n");
    xml
}

#[divan::bench(args = [20, 200])]
fn parse_efetch(bencher: divan::Bencher, n: usize) {
    let doc = synthetic_document(n);
    bencher.bench(|| parse_pubmed_xml(&doc).unwrap());
}

#[divan::bench(args = [20, 200])]
fn parse_and_extract(bencher: divan::Bencher, n: usize) {
    let doc = synthetic_document(n);
    let classifier = HeuristicClassifier::builtin().unwrap();
    bencher.bench(|| {
        parse_pubmed_xml(&doc)
            .unwrap()
            .iter()
            .map(|article| extract(article, &classifier))
            .count()
    });
}

fn main() {
    divan::main();
}
