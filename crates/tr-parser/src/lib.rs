//! Line-driven parser turning `.http`-style document text into a
//! `tr_document::Document` (spec §4.1).
//!
//! Parsing never fails outright: malformed constructs are recorded as
//! `ParseError`s on the returned document instead of aborting the parse.

mod args;
mod parser;
mod regexes;
mod workflow_frames;

use tr_document::Document;

/// Parses a full document's source text.
pub fn parse(text: &str) -> Document {
    parser::Parser::new().run(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_document::{Method, Scope};

    #[test]
    fn parses_a_simple_get_with_header_and_variable() {
        let src = r#"
@base_url = https://api.example.com

GET {{base_url}}/health
Authorization: Bearer xyz
"#;
        let doc = parse(src);
        assert!(doc.errors.is_empty());
        assert_eq!(doc.file_variables.len(), 1);
        assert_eq!(doc.file_variables[0].name, "base_url");
        assert_eq!(doc.file_variables[0].scope, Scope::File);

        let requests: Vec<_> = doc.requests().collect();
        assert_eq!(requests.len(), 1);
        let req = requests[0];
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "{{base_url}}/health");
        assert_eq!(req.headers.get("Authorization"), Some("Bearer xyz"));
    }

    #[test]
    fn separator_splits_multiple_requests() {
        let src = "GET https://a.test/one\n###\nPOST https://a.test/two\nContent-Type: application/json\n\n{\"x\":1}\n";
        let doc = parse(src);
        let requests: Vec<_> = doc.requests().collect();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://a.test/one");
        assert_eq!(requests[1].url, "https://a.test/two");
        assert!(matches!(
            requests[1].body.content,
            tr_document::BodyContent::Inline(ref s) if s == "{\"x\":1}"
        ));
    }

    #[test]
    fn name_and_capture_directives_attach_to_request() {
        let src = r#"
# @name login
POST https://a.test/login
Content-Type: application/json

{"user":"a"}
# @capture request token = $.body.token
"#;
        let doc = parse(src);
        let req = doc.find_request("login").expect("named request");
        assert_eq!(req.metadata.captures.len(), 1);
        assert_eq!(req.metadata.captures[0].name, "token");
    }

    #[test]
    fn workflow_if_else_builds_branches() {
        let src = r#"
@workflow smoke
@step using=login name=do-login
@if status == 200
@step using=profile
@else
@step using=retry-login
"#;
        let doc = parse(src);
        let wf = doc.find_workflow("smoke").expect("workflow");
        assert_eq!(wf.steps.len(), 2);
        assert!(matches!(wf.steps[0], tr_document::WorkflowStep::Request(_)));
        match &wf.steps[1] {
            tr_document::WorkflowStep::If(if_step) => {
                assert_eq!(if_step.cond, "status == 200");
                assert_eq!(if_step.then_branch.len(), 1);
                assert_eq!(if_step.else_branch.len(), 1);
            }
            other => panic!("expected an If step, got {other:?}"),
        }
    }
}
