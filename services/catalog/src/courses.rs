use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use coursehub_auth::Claims;
use coursehub_common::AppError;
use coursehub_database::Course;

use crate::models::{CreateCourseRequest, UpdateCourseRequest};

pub fn validate_course_request(title: &str, price: Decimal) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Course title is required".to_string()));
    }
    if price < Decimal::ZERO {
        return Err(AppError::Validation(
            "Course price must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CourseService {
    db_pool: PgPool,
}

impl CourseService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // New courses start unpublished; the author publishes explicitly.
    pub async fn create(
        &self,
        claims: &Claims,
        request: CreateCourseRequest,
    ) -> Result<Course, AppError> {
        validate_course_request(&request.title, request.price)?;

        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (author_id, title, description, price, requirements, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(claims.user_id())
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.requirements.clone().unwrap_or_default())
        .bind(&request.category)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        tracing::info!(course_id = %course.course_id, author = %claims.user_id(), "course created");
        Ok(course)
    }

    /// Unpublished courses are visible to their author and admins only;
    /// everyone else sees a 404.
    pub async fn get(&self, course_id: Uuid, viewer: Option<&Claims>) -> Result<Course, AppError> {
        let course = self.get_course(course_id).await?;

        if !course.published {
            let allowed = viewer
                .map(|claims| claims.user_id() == course.author_id || claims.is_admin())
                .unwrap_or(false);
            if !allowed {
                return Err(AppError::NotFound("Course not found".to_string()));
            }
        }

        Ok(course)
    }

    pub async fn list_published(&self, category: Option<String>) -> Result<Vec<Course>, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE published AND ($1::text IS NULL OR category = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(category)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_by_author(&self, claims: &Claims) -> Result<Vec<Course>, AppError> {
        sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE author_id = $1 ORDER BY created_at DESC",
        )
        .bind(claims.user_id())
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update(
        &self,
        claims: &Claims,
        course_id: Uuid,
        request: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        if let Some(price) = request.price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation(
                    "Course price must not be negative".to_string(),
                ));
            }
        }

        let course = self.get_course(course_id).await?;
        self.require_author(claims, &course)?;

        let updated = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                requirements = COALESCE($4, requirements),
                category = COALESCE($5, category),
                image_url = COALESCE($6, image_url),
                updated_at = now()
            WHERE course_id = $7
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.requirements.clone())
        .bind(&request.category)
        .bind(&request.image_url)
        .bind(course_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(updated)
    }

    pub async fn set_published(
        &self,
        claims: &Claims,
        course_id: Uuid,
        published: bool,
    ) -> Result<Course, AppError> {
        let course = self.get_course(course_id).await?;
        self.require_author(claims, &course)?;

        let updated = sqlx::query_as::<_, Course>(
            "UPDATE courses SET published = $1, updated_at = now() WHERE course_id = $2 RETURNING *",
        )
        .bind(published)
        .bind(course_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        tracing::info!(%course_id, published, "course publish state changed");
        Ok(updated)
    }

    /// Deletes the course; videos, reviews, and progress rows go with it
    /// via foreign-key cascade.
    pub async fn delete(&self, claims: &Claims, course_id: Uuid) -> Result<Course, AppError> {
        let course = self.get_course(course_id).await?;
        claims.require_owner_or_admin(course.author_id)?;

        sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        tracing::info!(%course_id, "course deleted");
        Ok(course)
    }

    pub async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    /// Content gate: the author, admins, and enrolled buyers may consume a
    /// course's videos; anonymous callers never can.
    pub async fn has_content_access(
        &self,
        claims: Option<&Claims>,
        course: &Course,
    ) -> Result<bool, AppError> {
        match claims {
            None => Ok(false),
            Some(c) if c.user_id() == course.author_id || c.is_admin() => Ok(true),
            Some(c) => self.is_enrolled(c.user_id(), course.course_id).await,
        }
    }

    /// Fetches a course the caller must be the author of.
    pub async fn get_owned(&self, claims: &Claims, course_id: Uuid) -> Result<Course, AppError> {
        let course = self.get_course(course_id).await?;
        self.require_author(claims, &course)?;
        Ok(course)
    }

    async fn get_course(&self, course_id: Uuid) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE course_id = $1")
            .bind(course_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    fn require_author(&self, claims: &Claims, course: &Course) -> Result<(), AppError> {
        if claims.user_id() != course.author_id {
            return Err(AppError::Authorization(
                "Only the course author can modify it".to_string(),
            ));
        }
        Ok(())
    }
}
