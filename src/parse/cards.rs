//! Field extraction from rendered search-result cards.
//!
//! Search pages are collected as one owned HTML string per card (see [`select_cards`]) and each
//! card is parsed on its own, so no parsed document outlives the request that produced it.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::constants::{COMMENT_LABEL, FORWARD_LABEL, LIKE_LABEL};
use crate::error::{Error, Result};
use crate::model::post::{
    AuthorInfo, CommentAct, PostText, SearchAct, SearchContent, SearchPost, VideoSource,
};
use crate::model::search::{SearchType, TopicStub, UserStub};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Invalid selector")
}

static POST_CARD: LazyLock<Selector> = LazyLock::new(|| selector("div.card-wrap[mid]"));
static PLAIN_CARD: LazyLock<Selector> = LazyLock::new(|| selector("div.card"));
static CARD_FEED: LazyLock<Selector> = LazyLock::new(|| selector(".card-feed"));
static CARD_ACT: LazyLock<Selector> = LazyLock::new(|| selector(".card-act"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static INFO: LazyLock<Selector> = LazyLock::new(|| selector(".info"));
static NAME_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a.name"));
static FROM: LazyLock<Selector> = LazyLock::new(|| selector(".from"));
static NICK_TEXT: LazyLock<Selector> = LazyLock::new(|| selector(".txt[nick-name]"));
static MEDIA: LazyLock<Selector> = LazyLock::new(|| selector(".media"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static VIDEO_PLAYER: LazyLock<Selector> = LazyLock::new(|| selector("video-player"));
static VIDEO: LazyLock<Selector> = LazyLock::new(|| selector("video"));
static CARD_COMMENT: LazyLock<Selector> = LazyLock::new(|| selector(".card-comment"));
static FUNC: LazyLock<Selector> = LazyLock::new(|| selector(".func"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static NAME: LazyLock<Selector> = LazyLock::new(|| selector(".name"));
static NOBR: LazyLock<Selector> = LazyLock::new(|| selector(".s-nobr"));
static M_ERROR: LazyLock<Selector> = LazyLock::new(|| selector(".m-error"));

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static UID_IN_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d+)\?").unwrap());
static PLAYER_OPTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"type:'(?P<type>.*?)'.*?src:'(?P<src>.*?)'").unwrap()
});
static TOPIC_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#.*#$").unwrap());
static TOPIC_NUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d.*讨论.*阅读$").unwrap());

/// Collect the result cards of one search page as owned HTML strings.
#[must_use]
pub fn select_cards(html: &str, search_type: SearchType) -> Vec<String> {
    let document = Html::parse_document(html);
    let card_selector: &Selector = match search_type {
        SearchType::User | SearchType::Topic => &PLAIN_CARD,
        SearchType::Weibo | SearchType::Realtime | SearchType::Video => &POST_CARD,
    };
    document.select(card_selector).map(|card| card.html()).collect()
}

/// The total result count the platform reports on the first search page, if any.
#[must_use]
pub fn parse_search_max(html: &str) -> Option<usize> {
    let document = Html::parse_document(html);
    let notice = document.select(&M_ERROR).next()?;
    let text: String = notice.text().collect();
    DIGITS.find(&text)?.as_str().parse().ok()
}

/// Extract a search-shape post from one `card-wrap` card.
///
/// # Errors
///
/// Returns [`Error::MissingField`] naming the first required tag or attribute that is absent.
pub fn parse_post_card(card_html: &str) -> Result<SearchPost> {
    let fragment = Html::parse_fragment(card_html);
    let card = card_root(&fragment)?;
    let mid = attr(card, "mid")?;

    let content = first(card, &CARD_FEED, "card-feed")?;
    let act_items: Vec<ElementRef> = first(card, &CARD_ACT, "card-act")?
        .select(&LIST_ITEM)
        .collect();
    let [forward_item, comment_item, like_item, ..] = act_items.as_slice() else {
        return Err(Error::missing("card-act li"));
    };

    let anchor = first(first(content, &INFO, "info")?, &NAME_ANCHOR, "info a.name")?;
    let href = attr(anchor, "href")?;
    let uid = UID_IN_HREF
        .captures(href)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| Error::missing("author uid"))?
        .as_str()
        .to_string();

    let text_tag = content
        .select(&NICK_TEXT)
        .last()
        .ok_or_else(|| Error::missing("txt[nick-name]"))?;

    let (video, image) = match content.select(&MEDIA).next() {
        Some(media) => extract_media(media)?,
        None => (None, None),
    };

    Ok(SearchPost {
        content: SearchContent {
            info: AuthorInfo {
                url: format!("https:{href}"),
                name: attr(anchor, "nick-name")?.to_string(),
            },
            time: extract_time(content)?,
            text: PostText {
                text: text_tag.text().collect::<String>().trim().to_string(),
                raw: text_tag.inner_html(),
            },
            video,
            image,
            forward: extract_forward(content)?,
        },
        act: SearchAct {
            forward: normalize_count(&stripped_text(*forward_item), FORWARD_LABEL),
            comment: CommentAct {
                num: normalize_count(&stripped_text(*comment_item), COMMENT_LABEL),
                mid: mid.to_string(),
                uid,
            },
            like: normalize_count(&stripped_text(*like_item), LIKE_LABEL),
        },
    })
}

/// Extract a user stub from one user-search card.
///
/// # Errors
///
/// Returns an error if the name anchor or follower line is absent.
pub fn parse_user_card(card_html: &str) -> Result<UserStub> {
    let fragment = Html::parse_fragment(card_html);
    let card = card_root(&fragment)?;
    let name = first(card, &NAME, "name")?;

    Ok(UserStub {
        url: format!("https:{}", attr(name, "href")?),
        name: stripped_text(name),
        num: stripped_text(first(card, &NOBR, "s-nobr")?),
    })
}

/// Extract a topic stub from one topic-search card.
///
/// # Errors
///
/// Returns an error if the card has no `#topic#` title or no discussion/read line.
pub fn parse_topic_card(card_html: &str) -> Result<TopicStub> {
    let fragment = Html::parse_fragment(card_html);
    let card = card_root(&fragment)?;

    Ok(TopicStub {
        name: find_text(card, &TOPIC_NAME, "topic name")?,
        num: find_text(card, &TOPIC_NUM, "topic num")?,
    })
}

fn find_text(card: ElementRef, pattern: &Regex, field: &str) -> Result<String> {
    card.text()
        .map(str::trim)
        .find(|text| pattern.is_match(text))
        .map(str::to_string)
        .ok_or_else(|| Error::missing(field))
}

/// Replace an action-bar label shown in place of a zero count with `"0"`.
fn normalize_count(text: &str, label: &str) -> String {
    let count = text.replace(label, "");
    let count = count.trim();
    if count.is_empty() {
        "0".to_string()
    } else {
        count.to_string()
    }
}

/// Time of the post itself; a quoted original inside `card-comment` carries its own `.from`.
fn extract_time(content: ElementRef) -> Result<String> {
    content
        .select(&FROM)
        .find(|from| !inside_quote(*from))
        .ok_or_else(|| Error::missing("from"))?
        .text()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::missing("from time"))
}

type CardMedia = (Option<VideoSource>, Option<Vec<String>>);

fn inside_quote(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().classes().any(|class| class == "card-comment"))
}

fn extract_media(media: ElementRef) -> Result<CardMedia> {
    if media.select(&IMG).next().is_some() {
        let images = media
            .select(&IMG)
            .map(|img| attr(img, "src").map(|src| src.replace("orj360", "large")))
            .collect::<Result<Vec<_>>>()?;
        return Ok((None, Some(images)));
    }

    // Older cards embed the player config as a JS-like object literal.
    if let Some(player) = media.select(&VIDEO_PLAYER).next() {
        let options = attr(player, ":options")?.replace('\n', "");
        let caps = PLAYER_OPTIONS
            .captures(&options)
            .ok_or_else(|| Error::missing("video-player options type/src"))?;
        let video = VideoSource {
            kind: caps["type"].to_string(),
            src: format!("https:{}", &caps["src"]),
        };
        return Ok((Some(video), None));
    }

    if let Some(video) = media.select(&VIDEO).next() {
        let video = VideoSource {
            kind: attr(video, "x5-video-player-type")?.to_string(),
            src: attr(video, "src")?.to_string(),
        };
        return Ok((Some(video), None));
    }

    Ok((None, None))
}

fn extract_forward(content: ElementRef) -> Result<Option<String>> {
    let Some(quoted) = content.select(&CARD_COMMENT).next() else {
        return Ok(None);
    };
    let func = first(quoted, &FUNC, "card-comment func")?;
    let from = first(func, &FROM, "card-comment from")?;
    let link = first(from, &ANCHOR, "card-comment from a")?;
    Ok(Some(format!("https:{}", attr(link, "href")?)))
}

fn card_root(fragment: &Html) -> Result<ElementRef<'_>> {
    fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)
        .ok_or_else(|| Error::missing("card"))
}

fn first<'a>(scope: ElementRef<'a>, selector: &Selector, field: &str) -> Result<ElementRef<'a>> {
    scope
        .select(selector)
        .next()
        .ok_or_else(|| Error::missing(field))
}

fn attr<'a>(element: ElementRef<'a>, name: &str) -> Result<&'a str> {
    element
        .value()
        .attr(name)
        .ok_or_else(|| Error::missing(format!("{}[{name}]", element.value().name())))
}

fn stripped_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
