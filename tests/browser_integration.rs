use guide_engine::agent::{GuideConfig, GuideDriver, GuideTask, InMemorySessionLog, ScriptedModel};
use guide_engine::dom::page::{Page, SnapshotSource};
use guide_engine::guide::ActionExecutor;
use guide_engine::{BrowserSession, LaunchOptions};
use serde_json::json;
use std::sync::Arc;

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", urlencoding::encode(html))
}

fn launch(html: &str) -> BrowserSession {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true))
        .expect("Failed to launch browser");
    session.navigate(&data_url(html)).expect("Failed to navigate");
    session
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_snapshot_indexes_visible_controls() {
    let session = launch(
        "<html><body>\
         <button id='refund'>Request refund</button>\
         <a href='#orders'>Orders</a>\
         <button style='display:none'>Hidden</button>\
         </body></html>",
    );

    let snapshot = session.snapshot().expect("Failed to snapshot");

    assert_eq!(snapshot.elements.len(), 2);
    assert_eq!(snapshot.element(0).unwrap().tag_name, "button");
    assert_eq!(snapshot.element(1).unwrap().tag_name, "a");
}

#[tokio::test]
#[ignore]
async fn test_page_resolves_and_types() {
    let session = launch("<html><body><textarea id='reason'>old</textarea></body></html>");
    let page = session.page().expect("No active tab");
    let snapshot = page.snapshot().await.expect("Failed to snapshot");
    let xpath = snapshot.element(0).expect("textarea not indexed").xpath.clone();

    let handle = page.inspect(&xpath).await.unwrap().expect("xpath did not resolve");
    assert!(handle.accepts_text());

    assert!(page.clear(&xpath).await.unwrap());
    for key in "new".chars() {
        assert!(page.send_key(&xpath, key).await.unwrap());
    }

    let value = session
        .tab()
        .unwrap()
        .evaluate("document.getElementById('reason').value", false)
        .unwrap()
        .value
        .unwrap();
    assert_eq!(value, json!("new"));
}

#[tokio::test]
#[ignore]
async fn test_guide_selects_option_and_finishes() {
    let session = launch(
        "<html><body>\
         <select id='reason'><option value=''>Choose</option><option value='damaged'> Damaged </option></select>\
         </body></html>",
    );
    let page = Arc::new(session.page().expect("No active tab"));
    let model = Arc::new(ScriptedModel::new(vec![
        json!({
            "current_state": {"evaluation_previous_goal": "Unknown", "next_goal": "Pick the reason"},
            "action": {"type": "select_dropdown_option", "index": 0, "text": "Damaged"}
        }),
        json!({
            "current_state": {"evaluation_previous_goal": "Success", "next_goal": "Finish"},
            "action": {"type": "done", "text": "Reason selected", "success": true}
        }),
    ]));

    let mut driver = GuideDriver::new(
        GuideConfig::default(),
        model,
        page.clone(),
        Box::new(ActionExecutor::for_page(page)),
        Arc::new(InMemorySessionLog::new()),
    );
    let outcome = driver.run(GuideTask::new("Pick a refund reason")).await.unwrap();
    assert!(outcome.success());

    let tab = session.tab().unwrap();
    let value = tab
        .evaluate("document.getElementById('reason').value", false)
        .unwrap()
        .value
        .unwrap();
    assert_eq!(value, json!("damaged"));

    // The indicator is removed when the session ends
    let hand = tab
        .evaluate("document.getElementById('__guide_hand') === null", false)
        .unwrap()
        .value
        .unwrap();
    assert_eq!(hand, json!(true));
}
