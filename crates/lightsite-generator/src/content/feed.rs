//! RSS and Atom feeds of a collection.
//!
//! A feed captures its collection when it is created (typically
//! `site.at("posts")`) and resolves entry URLs from the frozen task list
//! when it is written.

use atom_syndication::{Entry, Feed, Generator, Link, Person, Text};
use lightsite_core::{
    Author, CollectionInfo, Content, ContentCollection, EntryInfo, GenContext, GenPath, Result,
};
use rss::{ChannelBuilder, GuidBuilder, ImageBuilder, Item, ItemBuilder};
use tracing::debug;

#[derive(Debug, Clone)]
struct FeedEntry {
    location: String,
    info: EntryInfo,
}

impl FeedEntry {
    fn url(&self, ctx: &GenContext) -> String {
        ctx.find_task(&self.location)
            .map(|task| task.url())
            .unwrap_or_else(|| ctx.site().url_for(&self.location))
    }
}

fn capture<C: ContentCollection + ?Sized>(collection: &C) -> (CollectionInfo, Vec<FeedEntry>) {
    let entries = collection
        .entries()
        .into_iter()
        .map(|(location, info)| FeedEntry { location, info })
        .collect();
    (collection.info().clone(), entries)
}

/// An RSS 2.0 feed.
#[derive(Debug, Clone)]
pub struct RssFeed {
    info: CollectionInfo,
    entries: Vec<FeedEntry>,
}

impl RssFeed {
    /// A feed of every item of `collection` exposing entry info.
    pub fn new<C: ContentCollection + ?Sized>(collection: &C) -> Self {
        let (info, entries) = capture(collection);
        Self { info, entries }
    }

    /// Generate the feed XML.
    pub fn render(&self, ctx: &GenContext) -> String {
        let info = &self.info;
        let items: Vec<Item> = self
            .entries
            .iter()
            .map(|entry| self.item(entry, ctx))
            .collect();

        let mut channel = ChannelBuilder::default();
        channel
            .title(info.title.clone().unwrap_or_default())
            .link(info.url.clone())
            .description(info.description.clone().unwrap_or_else(|| info.url.clone()))
            .language(info.language.clone())
            .copyright(info.copyright.clone())
            .last_build_date(info.updated.map(|d| d.to_rfc2822()))
            .generator(Some(format!("lightsite {}", ctx.tool_version())))
            .items(items);
        if let Some(icon_url) = &info.icon_url {
            let image = ImageBuilder::default()
                .url(icon_url.clone())
                .title(info.title.clone().unwrap_or_default())
                .link(info.url.clone())
                .build();
            channel.image(Some(image));
        }

        debug!(entries = self.entries.len(), "generating RSS feed");
        channel.build().to_string()
    }

    fn item(&self, entry: &FeedEntry, ctx: &GenContext) -> Item {
        let url = entry.url(ctx);
        let guid = GuidBuilder::default()
            .value(entry.location.clone())
            .permalink(false)
            .build();

        let mut builder = ItemBuilder::default();
        builder.title(entry.info.title.clone());
        builder.link(Some(url));
        builder.guid(Some(guid));
        builder.description(entry.info.summary.clone());
        builder.pub_date(entry.info.created.map(|d| d.to_rfc2822()));
        if let Some(author) = self.info.author.as_ref().and_then(rss_author) {
            builder.author(Some(author));
        }
        builder.build()
    }
}

impl Content for RssFeed {
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()> {
        path.create(self.render(ctx))
    }
}

/// RSS wants an email, optionally followed by the name in parentheses.
fn rss_author(author: &Author) -> Option<String> {
    let email = author.email.as_ref()?;
    Some(match &author.name {
        Some(name) => format!("{email} ({name})"),
        None => email.clone(),
    })
}

/// An Atom feed.
#[derive(Debug, Clone)]
pub struct AtomFeed {
    info: CollectionInfo,
    entries: Vec<FeedEntry>,
}

impl AtomFeed {
    /// A feed of every item of `collection` exposing entry info.
    pub fn new<C: ContentCollection + ?Sized>(collection: &C) -> Self {
        let (info, entries) = capture(collection);
        Self { info, entries }
    }

    /// Generate the feed XML.
    pub fn render(&self, ctx: &GenContext) -> String {
        let info = &self.info;
        let mut feed = Feed::default();

        feed.set_title(info.title.clone().unwrap_or_default());
        feed.set_id(info.url.clone());
        feed.set_links(vec![alternate(&info.url)]);
        feed.set_icon(info.icon_url.clone());
        feed.set_subtitle(info.description.clone().map(Text::plain));
        feed.set_updated(info.updated.unwrap_or_else(|| ctx.generated_at()));
        feed.set_authors(info.author.iter().map(person).collect::<Vec<_>>());
        feed.set_rights(info.copyright.clone().map(Text::plain));
        feed.set_lang(info.language.clone());
        feed.set_generator(Some(Generator {
            value: "lightsite".to_string(),
            uri: None,
            version: Some(ctx.tool_version().to_string()),
        }));

        let entries: Vec<Entry> = self
            .entries
            .iter()
            .map(|entry| {
                let mut item = Entry::default();
                item.set_title(entry.info.title.clone().unwrap_or_default());
                item.set_id(entry.location.clone());
                item.set_links(vec![alternate(&entry.url(ctx))]);
                item.set_summary(entry.info.summary.clone().map(Text::plain));
                item.set_authors(info.author.iter().map(person).collect::<Vec<_>>());
                item.set_published(entry.info.created.map(|d| d.fixed_offset()));
                let updated = entry
                    .info
                    .updated
                    .or(entry.info.created)
                    .unwrap_or_else(|| ctx.generated_at());
                item.set_updated(updated);
                item
            })
            .collect();
        feed.set_entries(entries);

        debug!(entries = self.entries.len(), "generating Atom feed");
        feed.to_string()
    }
}

impl Content for AtomFeed {
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()> {
        path.create(self.render(ctx))
    }
}

fn alternate(href: &str) -> Link {
    Link {
        href: href.to_string(),
        rel: "alternate".to_string(),
        mime_type: None,
        hreflang: None,
        title: None,
        length: None,
    }
}

fn person(author: &Author) -> Person {
    Person {
        name: author.name.clone().unwrap_or_default(),
        email: author.email.clone(),
        ..Default::default()
    }
}
