mod common;

use common::mock_data::TicketBuilder;
use common::{MockGateway, signed_in_session};
use ticketdesk::error::DeskError;
use ticketdesk::forms::Field;
use ticketdesk::session::SessionStore;
use ticketdesk::worknote::{EMPTY_COMMENT, WorknoteThread, post_worknote};

#[tokio::test]
async fn test_submit_appends_and_clears_draft() {
    let gateway = MockGateway::new();
    let session = signed_in_session();
    let ticket = TicketBuilder::new("1").build();

    let mut thread = WorknoteThread::from_ticket(&ticket);
    thread.set_draft("  Called the vendor  ");
    let note = thread.submit(&gateway, &session).await.unwrap().clone();

    assert_eq!(note.text, "Called the vendor");
    assert_eq!(note.author.display_name(), "Sarah Chen");
    assert!(note.at.is_some());
    assert!(thread.draft.is_empty());
    assert_eq!(thread.entries().len(), 1);

    let sent = gateway.worknotes.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.as_str(), "1");
    assert_eq!(sent[0].1.comment.description, "Called the vendor");
}

#[tokio::test]
async fn test_blank_note_is_rejected_without_request() {
    let gateway = MockGateway::new();
    let session = signed_in_session();
    let ticket = TicketBuilder::new("1").build();

    let mut thread = WorknoteThread::from_ticket(&ticket);
    thread.set_draft("   ");
    let err = thread.submit(&gateway, &session).await.unwrap_err();

    assert!(matches!(err, DeskError::Validation(_)));
    assert_eq!(thread.errors().get(Field::Comment), Some(EMPTY_COMMENT));
    assert!(gateway.worknotes.lock().is_empty());

    // Editing the draft clears the error.
    thread.set_draft("x");
    assert!(thread.errors().is_empty());
}

#[tokio::test]
async fn test_note_requires_sign_in() {
    let gateway = MockGateway::new();
    let anonymous = SessionStore::in_memory();
    let ticket = TicketBuilder::new("1").build();

    let err = post_worknote(&gateway, &anonymous, &ticket.id, "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::NotAuthenticated));
    assert!(gateway.worknotes.lock().is_empty());
}
