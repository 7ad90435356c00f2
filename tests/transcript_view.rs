use parley_tui::{
    format_markup, plan_chunks, Component, HeightCache, Layout, MarkupTheme, Message,
    TranscriptView,
};

fn plain_view() -> TranscriptView {
    let mut view = TranscriptView::new(Box::new(MarkupTheme::plain));
    view.set_viewport_rows(10);
    view
}

fn screen(view: &mut TranscriptView, width: usize) -> String {
    view.render(width).join("\n")
}

#[test]
fn streamed_text_appears_as_it_arrives() {
    let mut view = plain_view();
    view.push_message(Message::user(0, "hi"));
    view.push_message(Message::assistant(1, ""));

    view.update_message_text(1, "He");
    assert!(screen(&mut view, 40).contains("He"));

    view.update_message_text(1, "Hello");
    assert!(screen(&mut view, 40).contains("Hello"));
}

#[test]
fn view_follows_the_newest_message_while_pinned() {
    let mut view = plain_view();
    for i in 0..30 {
        view.push_message(Message::assistant(i, format!("reply number {i}")));
    }
    let rendered = screen(&mut view, 40);
    assert!(view.is_pinned_to_bottom());
    assert!(rendered.contains("reply number 29"));
    assert!(!rendered.contains("reply number 0"));
}

#[test]
fn scrolling_to_the_top_unpins_and_shows_history() {
    let mut view = plain_view();
    for i in 0..30 {
        view.push_message(Message::assistant(i, format!("reply number {i}")));
    }
    screen(&mut view, 40);
    view.scroll_up(10_000);
    let rendered = screen(&mut view, 40);
    assert!(!view.is_pinned_to_bottom());
    assert!(rendered.contains("reply number 0"));

    view.scroll_to_bottom();
    assert!(view.is_pinned_to_bottom());
    assert!(screen(&mut view, 40).contains("reply number 29"));
}

#[test]
fn reasoning_shows_as_quoted_block_without_markers() {
    let mut view = plain_view();
    view.push_message(Message::assistant(
        0,
        "<think>weighing the options</think>the answer",
    ));
    let rendered = screen(&mut view, 60);
    assert!(rendered.contains("weighing the options"));
    assert!(rendered.contains("the answer"));
    assert!(!rendered.contains("<think>"));
}

#[test]
fn measured_heights_add_up_to_the_layout_total() {
    let theme = || MarkupTheme::plain();
    let mut cache = HeightCache::new();
    let mut ids = Vec::new();
    let mut expected_total = 0;

    for i in 0..6 {
        let text = "A paragraph of steady prose. ".repeat(8 * (i as usize + 1));
        for chunk in plan_chunks(&Message::assistant(i, text)) {
            let lines = format_markup(&chunk.text, 32, theme());
            cache.record(chunk.id, lines.len());
            expected_total += lines.len().max(1);
            ids.push(chunk.id);
        }
    }
    assert!(cache.flush());

    let layout = Layout::compute(&ids, &cache);
    assert_eq!(layout.total_height(), expected_total);
    for index in 1..ids.len() {
        let prev = layout.offset_of(index - 1).unwrap();
        let this = layout.offset_of(index).unwrap();
        assert_eq!(this - prev, cache.height_of(ids[index - 1]));
    }
}

#[test]
fn math_order_is_preserved_through_formatting() {
    let lines = format_markup(
        "Start \\(a+b\\) middle \\[c^2\\] end",
        80,
        MarkupTheme::plain(),
    );
    let joined = lines.join("\n");
    let a = joined.find("a+b").expect("inline math should render");
    let c = joined.find("c^2").expect("display math should render");
    let end = joined.rfind("end").expect("trailing text should render");
    assert!(a < c && c < end);
    assert!(!joined.contains("\\("));
    assert!(!joined.contains("\\["));
}
