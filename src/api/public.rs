use mongodb::{
    bson::doc,
    options::{FindOneOptions, FindOptions},
};
use rocket::{
    futures::TryStreamExt,
    response::stream::{Event, EventStream},
    serde::json::Json,
    tokio::{select, sync::broadcast::error::RecvError},
    Route, Shutdown, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::question::{QuestionDescription, VoteSpec},
        db::question::Question,
        mongodb::{Coll, Id},
    },
    updates::UpdateBus,
};

pub fn routes() -> Vec<Route> {
    routes![get_questions, get_active_question, question_stream, cast_vote]
}

/// All questions, in store order.
#[get("/questions")]
async fn get_questions(questions: Coll<Question>) -> Result<Json<Vec<QuestionDescription>>> {
    Ok(Json(ordered_questions(&questions).await?))
}

/// The question currently open for voting: the first active one in store
/// order. 404 when no question is active.
#[get("/questions/active")]
async fn get_active_question(questions: Coll<Question>) -> Result<Json<QuestionDescription>> {
    let options = FindOneOptions::builder()
        .sort(doc! { "order": 1, "_id": 1 })
        .build();
    let question = questions
        .find_one(doc! { "is_active": true }, options)
        .await?
        .ok_or_else(|| Error::not_found("No question is currently active"))?;
    Ok(Json(question.into()))
}

/// Live snapshots of the full question list: one event on connect, then one
/// after every mutation. Snapshots are whole lists, not diffs, so a client
/// that misses an event loses nothing once the next one arrives.
#[get("/questions/stream")]
async fn question_stream(
    questions: Coll<Question>,
    bus: &State<UpdateBus>,
    mut end: Shutdown,
) -> EventStream![] {
    let mut updates = bus.subscribe();
    EventStream! {
        match ordered_questions(&questions).await {
            Ok(list) => yield Event::json(&list),
            Err(err) => warn!("Dropping initial snapshot: {err}"),
        }
        loop {
            let list = select! {
                update = updates.recv() => match update {
                    Err(RecvError::Closed) => break,
                    // Received or lagged: either way the list has changed
                    // since the last emit, so read a fresh snapshot.
                    _ => match ordered_questions(&questions).await {
                        Ok(list) => list,
                        Err(err) => {
                            warn!("Dropping snapshot: {err}");
                            continue;
                        }
                    },
                },
                _ = &mut end => break,
            };
            yield Event::json(&list);
        }
    }
}

/// Record one vote: a single atomic increment of the chosen option's tally.
/// Concurrent votes on the same option cannot lose updates.
#[post("/questions/<question_id>/votes", data = "<vote>", format = "json")]
async fn cast_vote(
    question_id: Id,
    vote: Json<VoteSpec>,
    questions: Coll<Question>,
    updates: &State<UpdateBus>,
) -> Result<()> {
    // Ensure the question and option exist and voting is open.
    let question = questions
        .find_one(question_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question {question_id}")))?;
    if !question.is_active {
        return Err(Error::bad_request(format!(
            "Question {question_id} is not open for voting"
        )));
    }
    if !question.options.contains(&vote.option) {
        return Err(Error::not_found(format!(
            "Option {:?} for question {question_id}",
            vote.option
        )));
    }

    // The filter re-checks liveness, so a question deleted or closed while
    // the vote was in flight fails instead of being resurrected.
    let vote_field = format!("votes.{}", vote.option);
    let filter = doc! {
        "_id": *question_id,
        "is_active": true,
    };
    let update = doc! {
        "$inc": { &vote_field: 1_i64 },
    };
    let result = questions.update_one(filter, update, None).await?;
    if result.modified_count == 0 {
        return Err(Error::not_found(format!("Question {question_id}")));
    }

    updates.publish();
    Ok(())
}

/// Read the full question list in store order: by `order`, ties broken by
/// ID so snapshots are stable.
async fn ordered_questions(questions: &Coll<Question>) -> Result<Vec<QuestionDescription>> {
    let options = FindOptions::builder()
        .sort(doc! { "order": 1, "_id": 1 })
        .build();
    let list = questions
        .find(None, options)
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .map(QuestionDescription::from)
        .collect();
    Ok(list)
}
