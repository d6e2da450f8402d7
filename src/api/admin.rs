use mongodb::{
    bson::{doc, to_bson},
    Client,
};
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            question::{QuestionDescription, QuestionSpec},
        },
        db::question::{NewQuestion, Question},
        mongodb::{Coll, Id},
    },
    updates::UpdateBus,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_question,
        update_question,
        toggle_question,
        delete_question,
    ]
}

#[post("/questions", data = "<spec>", format = "json")]
async fn create_question(
    _token: AuthToken,
    spec: Json<QuestionSpec>,
    new_questions: Coll<NewQuestion>,
    questions: Coll<Question>,
    db_client: &State<Client>,
    updates: &State<UpdateBus>,
) -> Result<Json<QuestionDescription>> {
    let spec = spec.0;
    spec.validate().map_err(Error::bad_request)?;

    // Count-then-insert inside a transaction, so `order` is exactly the
    // question count at the moment of creation.
    let question = {
        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        let order = questions
            .count_documents_with_session(None, None, &mut session)
            .await? as i64;

        // Create and insert the question.
        let question = spec.into_question(order);
        let new_id: Id = new_questions
            .insert_one_with_session(&question, None, &mut session)
            .await?
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB
            .into();

        // Retrieve the full question including ID.
        let question = questions
            .find_one_with_session(new_id.as_doc(), None, &mut session)
            .await?
            .unwrap();

        session.commit_transaction().await?;
        question
    };

    updates.publish();
    Ok(Json(question.into()))
}

#[put("/questions/<question_id>", data = "<spec>", format = "json")]
async fn update_question(
    _token: AuthToken,
    question_id: Id,
    spec: Json<QuestionSpec>,
    questions: Coll<Question>,
    updates: &State<UpdateBus>,
) -> Result<Json<QuestionDescription>> {
    let spec = spec.0;
    spec.validate().map_err(Error::bad_request)?;

    // Overwrite the prompt and options only. Existing tallies are left
    // untouched: counts for renamed labels survive under the old key and
    // new labels read as zero.
    let update = doc! {
        "$set": {
            "text": &spec.text,
            "options": to_bson(&spec.options).expect("string arrays always serialize"),
        }
    };
    let result = questions
        .update_one(question_id.as_doc(), update, None)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Question {question_id}")));
    }

    let question = questions
        .find_one(question_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question {question_id}")))?;

    updates.publish();
    Ok(Json(question.into()))
}

#[post("/questions/<question_id>/toggle")]
async fn toggle_question(
    _token: AuthToken,
    question_id: Id,
    questions: Coll<Question>,
    db_client: &State<Client>,
    updates: &State<UpdateBus>,
) -> Result<Json<QuestionDescription>> {
    // Activating must displace whichever question is currently active, so
    // the whole flip happens in one transaction.
    let question = {
        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        let question = questions
            .find_one_with_session(question_id.as_doc(), None, &mut session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Question {question_id}")))?;

        if question.is_active {
            // Closing the active question activates nothing else.
            questions
                .update_one_with_session(
                    question_id.as_doc(),
                    doc! { "$set": { "is_active": false } },
                    None,
                    &mut session,
                )
                .await?;
        } else {
            questions
                .update_many_with_session(
                    doc! { "is_active": true },
                    doc! { "$set": { "is_active": false } },
                    None,
                    &mut session,
                )
                .await?;
            questions
                .update_one_with_session(
                    question_id.as_doc(),
                    doc! { "$set": { "is_active": true } },
                    None,
                    &mut session,
                )
                .await?;
        }

        let question = questions
            .find_one_with_session(question_id.as_doc(), None, &mut session)
            .await?
            .unwrap(); // Presence already checked.

        session.commit_transaction().await?;
        question
    };

    updates.publish();
    Ok(Json(question.into()))
}

#[delete("/questions/<question_id>")]
async fn delete_question(
    _token: AuthToken,
    question_id: Id,
    questions: Coll<Question>,
    updates: &State<UpdateBus>,
) -> Result<()> {
    // Permanent removal. The `order` values of surviving questions are not
    // renumbered, so the sort key develops gaps.
    let result = questions.delete_one(question_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Question {question_id}")));
    }

    updates.publish();
    Ok(())
}
